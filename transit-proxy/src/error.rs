//! Errors surfaced by the proxy to its callers.

use crate::domain::InputError;
use crate::upstream::UpstreamError;

/// Failure of a single or batch arrival request.
///
/// Enrichment problems never appear here: a missing display name is not an
/// error, and directory refresh failures are absorbed by the directory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProxyError {
    /// The caller sent something we refuse to forward upstream
    #[error(transparent)]
    Input(#[from] InputError),

    /// The upstream call for the requested stop failed
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl ProxyError {
    /// HTTP status to report to the caller.
    ///
    /// Upstream error statuses are passed through so that, e.g., an upstream
    /// 401 for a bad key reaches the caller as a 401.
    pub fn status_code(&self) -> u16 {
        match self {
            ProxyError::Input(_) => 400,
            ProxyError::Upstream(UpstreamError::Status { status, .. })
                if (400..=599).contains(status) =>
            {
                *status
            }
            ProxyError::Upstream(UpstreamError::InvalidApiKey) => 400,
            ProxyError::Upstream(_) => 502,
        }
    }
}
