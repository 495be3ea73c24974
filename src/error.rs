#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Missing binding for placeholder ':{0}'")]
    MissingBinding(String),

    #[error("HTTP driver is missing")]
    TransportUnavailable,

    #[error("Malformed response: {reason}")]
    MalformedResponse { reason: String, body: String },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Fetch failed: {0}")]
    FetchFailed(Box<CatalogError>),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cache error: {0}")]
    Cache(String),
}

impl CatalogError {
    /// Build a [`CatalogError::MalformedResponse`] carrying the raw body for diagnostics.
    pub fn malformed(reason: impl Into<String>, body: impl Into<String>) -> Self {
        CatalogError::MalformedResponse {
            reason: reason.into(),
            body: body.into(),
        }
    }

    /// Unwrap any [`CatalogError::FetchFailed`] layers and return the underlying error.
    pub fn root_cause(&self) -> &CatalogError {
        match self {
            CatalogError::FetchFailed(inner) => inner.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
