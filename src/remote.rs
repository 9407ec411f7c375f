//! The remote array handle.

use std::sync::Arc;

use futures::future::try_join_all;
use log::{debug, trace};
use url::Url;

use crate::codec::SliceCodec;
use crate::config::{self, ClientConfig, URLBASE_ENV_NAME};
use crate::engine::{ArrayEngine, BloscEngine};
use crate::error::{RemoteError, RemoteResult};
use crate::index::IndexExpression;
use crate::metadata::ArrayInfo;
use crate::region::ArrayRegion;
use crate::transport::{HttpTransport, Request, Transport};

/// Query parameter carrying the wire slice string.
pub const SLICE_PARAM: &str = "slice_";

// ---------------------------------------------------------------------------
// RemoteArray
// ---------------------------------------------------------------------------

/// A read-only view of an array held by a subscriber service.
///
/// Metadata is fetched once, when the handle is opened, and never changes
/// afterwards; every [`get`](Self::get) is an independent request. Clones
/// share the transport and engine.
#[derive(Clone)]
pub struct RemoteArray {
    path: String,
    base_url: Url,
    auth_token: Option<String>,
    info: ArrayInfo,
    transport: Arc<dyn Transport>,
    engine: Arc<dyn ArrayEngine>,
}

impl std::fmt::Debug for RemoteArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteArray")
            .field("path", &self.path)
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.auth_token.is_some())
            .field("info", &self.info)
            .finish()
    }
}

impl RemoteArray {
    /// Open the array at `path` on the subscriber at `base_url`
    /// (slash-terminated), over HTTP configured from the environment.
    pub async fn open(
        path: impl Into<String>,
        base_url: &str,
        auth_token: Option<String>,
    ) -> RemoteResult<Self> {
        Self::open_with_config(path, base_url, auth_token, &ClientConfig::from_env()).await
    }

    pub async fn open_with_config(
        path: impl Into<String>,
        base_url: &str,
        auth_token: Option<String>,
        config: &ClientConfig,
    ) -> RemoteResult<Self> {
        let transport = HttpTransport::new(config)
            .map_err(|e| RemoteError::Other(format!("Failed to build HTTP client: {e}")))?;
        Self::open_with(
            path,
            base_url,
            auth_token,
            Arc::new(transport),
            Arc::new(BloscEngine::default()),
        )
        .await
    }

    /// Open using `C2ARRAY_URLBASE` and, if set, `C2ARRAY_AUTH_TOKEN`.
    pub async fn from_env(path: impl Into<String>) -> RemoteResult<Self> {
        let (base_url, auth_token) = config::env_location();
        let base_url = base_url
            .ok_or_else(|| RemoteError::InvalidUrl(format!("{URLBASE_ENV_NAME} is not set")))?;
        Self::open(path, &base_url, auth_token).await
    }

    /// Open with explicit collaborators. Performs exactly one request, for
    /// the array metadata.
    pub async fn open_with(
        path: impl Into<String>,
        base_url: &str,
        auth_token: Option<String>,
        transport: Arc<dyn Transport>,
        engine: Arc<dyn ArrayEngine>,
    ) -> RemoteResult<Self> {
        let path = path.into();
        let base_url = parse_base_url(base_url)?;

        let url = endpoint(&base_url, "info", &path)?;
        let request = Request::new(url, auth_token.clone());
        debug!("fetching metadata for {path} from {}", request.url);
        let body = transport
            .get(&request)
            .await
            .map_err(|source| RemoteError::MetadataFetch {
                url: request.url.to_string(),
                source,
            })?;
        let info = ArrayInfo::parse(&body)?;

        Ok(Self {
            path,
            base_url,
            auth_token,
            info,
            transport,
            engine,
        })
    }

    // -- Identity and metadata ----------------------------------------------

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub fn info(&self) -> &ArrayInfo {
        &self.info
    }

    pub fn shape(&self) -> &[usize] {
        &self.info.shape
    }

    pub fn chunks(&self) -> &[usize] {
        &self.info.chunks
    }

    pub fn blocks(&self) -> &[usize] {
        &self.info.blocks
    }

    /// The storage-padded shape.
    pub fn ext_shape(&self) -> &[usize] {
        &self.info.ext_shape
    }

    /// The element type as reported by the server. Informational: decoded
    /// regions describe their own bytes.
    pub fn dtype(&self) -> &str {
        &self.info.dtype
    }

    pub fn ndim(&self) -> usize {
        self.info.ndim()
    }

    // -- Fetching ------------------------------------------------------------

    /// Fetch the region selected by `expr`.
    ///
    /// The expression is checked before anything is sent, so an unsupported
    /// index never reaches the network. A failed call leaves the handle
    /// usable.
    pub async fn get(&self, expr: impl Into<IndexExpression>) -> RemoteResult<ArrayRegion> {
        let expr = expr.into();
        expr.validate(self.ndim())?;
        let wire = SliceCodec::encode(&expr)?;
        trace!("{expr:?} encoded as {wire:?}");

        let mut url = endpoint(&self.base_url, "fetch", &self.path)?;
        url.query_pairs_mut().append_pair(SLICE_PARAM, wire.as_str());
        let request = Request::new(url, self.auth_token.clone());
        debug!("fetching {:?} of {}", wire.as_str(), self.path);

        let raw = self
            .transport
            .get(&request)
            .await
            .map_err(|source| RemoteError::Fetch {
                url: request.url.to_string(),
                source,
            })?;

        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || SliceCodec::decode(engine.as_ref(), &raw, &expr))
            .await
            .map_err(|e| RemoteError::Other(format!("Decode task join error: {e}")))?
    }

    /// Fetch several regions concurrently, returned in request order.
    pub async fn get_many<I, E>(&self, exprs: I) -> RemoteResult<Vec<ArrayRegion>>
    where
        I: IntoIterator<Item = E>,
        E: Into<IndexExpression>,
    {
        try_join_all(exprs.into_iter().map(|expr| self.get(expr))).await
    }
}

// ---------------------------------------------------------------------------
// URLs
// ---------------------------------------------------------------------------

fn parse_base_url(base_url: &str) -> RemoteResult<Url> {
    if !base_url.ends_with('/') {
        return Err(RemoteError::InvalidUrl(format!(
            "Base URL must end with '/': {base_url}"
        )));
    }
    let url = Url::parse(base_url)
        .map_err(|e| RemoteError::InvalidUrl(format!("{base_url}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(RemoteError::InvalidUrl(format!(
            "{base_url} cannot be used as a base URL"
        )));
    }
    Ok(url)
}

/// `{base}api/{endpoint}/{path}`, with each path segment percent-encoded.
/// Paths with empty segments (leading, trailing or doubled `/`) are
/// rejected.
fn endpoint(base_url: &Url, endpoint: &str, path: &str) -> RemoteResult<Url> {
    if path.split('/').any(str::is_empty) {
        return Err(RemoteError::InvalidUrl(format!(
            "Array path {path:?} has an empty segment"
        )));
    }
    let mut url = base_url.clone();
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|_| RemoteError::InvalidUrl(format!("{base_url} cannot be used as a base URL")))?
        .pop_if_empty()
        .extend(["api", endpoint])
        .extend(path.split('/'));
    Ok(url)
}
