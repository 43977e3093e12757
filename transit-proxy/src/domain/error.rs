//! Caller input errors.
//!
//! These are raised before any upstream work begins and are reported to the
//! caller verbatim. They are distinct from upstream/API errors.

use super::{InvalidStopCode, MissingApiKey};

/// Rejected caller input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    /// No API key was supplied
    #[error("missing API key")]
    MissingApiKey,

    /// The single-lookup stop code is empty or blank
    #[error("stop code must not be empty")]
    EmptyStopCode,

    /// Batch request contains no stop codes
    #[error("batch must contain at least one stop code")]
    EmptyBatch,

    /// Batch request exceeds the maximum size
    #[error("batch size {size} exceeds maximum allowed {max}")]
    BatchTooLarge { size: usize, max: usize },

    /// A stop code inside a batch is empty or blank
    #[error("invalid stop code at index {index}: must not be empty")]
    InvalidStopCode { index: usize },
}

impl From<MissingApiKey> for InputError {
    fn from(_: MissingApiKey) -> Self {
        InputError::MissingApiKey
    }
}

impl From<InvalidStopCode> for InputError {
    fn from(_: InvalidStopCode) -> Self {
        InputError::EmptyStopCode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = InputError::BatchTooLarge { size: 51, max: 50 };
        assert_eq!(err.to_string(), "batch size 51 exceeds maximum allowed 50");

        let err = InputError::InvalidStopCode { index: 3 };
        assert_eq!(
            err.to_string(),
            "invalid stop code at index 3: must not be empty"
        );

        assert_eq!(InputError::MissingApiKey.to_string(), "missing API key");
    }
}
