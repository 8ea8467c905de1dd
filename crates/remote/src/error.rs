use stockgrid_core::error::CoreError;

/// Errors from the remote request layer.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote answered 404 for `path`.
    #[error("Remote resource not found: {path}")]
    NotFound { path: String },

    /// The envelope reported `success: false`. The message may be empty.
    #[error("Remote call failed: {message}")]
    Failure { message: String },

    /// Non-2xx status without a readable failure envelope.
    #[error("Remote API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// The body was not the expected envelope.
    #[error("Malformed remote response: {0}")]
    Decode(String),
}

impl From<RemoteError> for CoreError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::NotFound { path } => CoreError::not_found("RemoteResource", path),
            RemoteError::Failure { message } => CoreError::Upstream(message),
            other => CoreError::Upstream(other.to_string()),
        }
    }
}
