use thiserror::Error;

use crate::transport::TransportError;

pub type RemoteResult<T> = Result<T, RemoteError>;

#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Unsupported index: {0}")]
    UnsupportedIndex(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to fetch metadata from {url}: {source}")]
    MetadataFetch {
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("Malformed metadata: {0}")]
    MalformedMetadata(String),

    #[error("Failed to fetch data from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Type conversion error: {0}")]
    TypeConversion(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
