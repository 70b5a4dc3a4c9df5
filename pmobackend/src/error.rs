//! Error types for backend access.

/// Result type alias for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Errors that can occur while talking to a backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// HTTP transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status from the backend
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request exceeded its deadline
    #[error("request timeout")]
    Timeout,

    /// Blob store refused to sign a path
    #[error("storage error: {0}")]
    Storage(String),

    /// Referenced entity does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Backend misconfiguration (missing base URL, key, ...)
    #[error("backend configuration: {0}")]
    Config(String),
}

impl BackendError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Builds `Status` from a response, consuming its body.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Self::Status { status, body }
    }

    /// True when the failure was a timeout, whatever layer reported it.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout => true,
            Self::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}
