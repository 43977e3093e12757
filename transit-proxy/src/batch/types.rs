//! Data types for batch arrival lookups.

use serde_json::Value;

use crate::domain::StopCode;

/// Maximum number of stop codes accepted in one batch request.
pub const MAX_BATCH_SIZE: usize = 50;

/// Number of stop codes looked up concurrently before moving to the next chunk.
pub const CHUNK_SIZE: usize = 50;

/// Outcome of one stop code within a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrivalOutcome {
    /// Arrivals were available, fresh from upstream or from cache.
    Success { payload: Value, was_cached: bool },
    /// The lookup failed; siblings in the batch are unaffected.
    Failure { message: String },
}

impl ArrivalOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ArrivalOutcome::Success { .. })
    }
}

/// Result for a single stop code, in the same position as the request.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    pub stop_code: StopCode,
    pub outcome: ArrivalOutcome,
}
