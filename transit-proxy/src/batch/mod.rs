//! Batch arrival lookups with per-item failure isolation.
//!
//! A batch is a list of up to 50 stop codes. Each code goes through the
//! same arrival cache as a single lookup, so cached stops cost nothing and
//! duplicate or concurrently requested stops share one upstream call.
//!
//! The batch as a whole only fails on malformed input. Upstream problems for
//! individual stops come back as per-item `Failure` records, positioned like
//! the request.

mod orchestrator;
mod types;

pub use orchestrator::{BatchConfig, BatchOrchestrator, validate};
pub use types::{ArrivalOutcome, BatchItem, CHUNK_SIZE, MAX_BATCH_SIZE};
