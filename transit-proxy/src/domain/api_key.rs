//! Caller-supplied upstream credential.

use std::fmt;

/// Error returned when a caller supplies no API key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing API key")]
pub struct MissingApiKey;

/// An upstream API key, supplied by the caller and forwarded verbatim.
///
/// The proxy does not own a credential of its own: every upstream request is
/// made with the key of the client that triggered it. Beyond non-emptiness
/// the format is not checked here; a bad key only shows up as an upstream
/// authorization failure.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a non-empty key.
    pub fn parse(s: &str) -> Result<Self, MissingApiKey> {
        if s.is_empty() {
            return Err(MissingApiKey);
        }
        Ok(ApiKey(s.to_string()))
    }

    /// The key exactly as supplied.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}
