pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod metadata;
pub mod region;
pub mod remote;
pub mod transport;
pub mod types;

// Re-export key types at crate root for convenience.
pub use codec::{SliceCodec, WireSlice};
pub use config::ClientConfig;
pub use engine::{ArrayEngine, BloscEngine, DecodedArray, FlatBuffer, PayloadKind};
pub use error::{RemoteError, RemoteResult};
pub use index::{AxisTerm, IndexExpression, RangeTerm};
pub use metadata::{ArrayInfo, ElementType};
pub use region::ArrayRegion;
pub use remote::RemoteArray;
pub use transport::{HttpTransport, Request, Transport, TransportError};
pub use types::{DataType, Endian, VectorValue};
