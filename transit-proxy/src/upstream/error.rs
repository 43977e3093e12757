//! Upstream API error types.

/// Errors that can occur when calling the upstream transit API.
///
/// `Clone` so that one failed fetch can be handed to every caller that was
/// waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpstreamError {
    /// API returned a non-success status. The raw body is kept for diagnostics.
    #[error("upstream error {status}: {body}")]
    Status { status: u16, body: String },

    /// HTTP request failed (connect, timeout, ...)
    #[error("HTTP error: {message}")]
    Transport { message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Decode {
        message: String,
        body: Option<String>,
    },

    /// The caller's key cannot be sent as a header value
    #[error("API key is not a valid header value")]
    InvalidApiKey,
}

impl UpstreamError {
    /// The upstream HTTP status, if the upstream answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        UpstreamError::Transport {
            message: err.to_string(),
        }
    }
}
