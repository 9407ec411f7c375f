//! Translation between index expressions and the fetch protocol.

pub mod wire;

use log::debug;

use crate::engine::{ArrayEngine, PayloadKind};
use crate::error::{RemoteError, RemoteResult};
use crate::index::IndexExpression;
use crate::region::ArrayRegion;

pub use wire::WireSlice;

/// Stateless encoder/decoder for the `api/fetch` endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct SliceCodec;

impl SliceCodec {
    /// Render `expr` as the wire string the service expects.
    ///
    /// # Errors
    ///
    /// [`RemoteError::UnsupportedIndex`] for any range with a step other
    /// than one.
    pub fn encode(expr: &IndexExpression) -> RemoteResult<WireSlice> {
        wire::encode(expr)
    }

    /// Decode a fetch response into the region `expr` selects.
    ///
    /// A slice frame already holds exactly the requested region and is
    /// returned flat. A container holds the whole array, so `expr` is
    /// applied to it locally.
    pub fn decode(
        engine: &dyn ArrayEngine,
        raw: &[u8],
        expr: &IndexExpression,
    ) -> RemoteResult<ArrayRegion> {
        let kind = engine.probe(raw);
        debug!("decoding {} byte payload as {kind}", raw.len());
        match kind {
            PayloadKind::SliceFrame => engine.decompress_frame(raw).map(ArrayRegion::from_frame),
            PayloadKind::Container => {
                let array = engine.open_container(raw)?;
                ArrayRegion::extract(&array, expr)
            }
            PayloadKind::Unknown => Err(RemoteError::Decode(format!(
                "Payload is neither a slice frame nor a container (leading bytes {:02x?})",
                &raw[..raw.len().min(8)]
            ))),
        }
    }
}
