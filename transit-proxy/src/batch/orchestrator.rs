//! Batch arrival lookup implementation.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::cache::ArrivalCache;
use crate::domain::{ApiKey, InputError, StopCode};
use crate::upstream::TransitApi;

use super::types::{ArrivalOutcome, BatchItem, CHUNK_SIZE, MAX_BATCH_SIZE};

/// Configuration for batch lookups.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Stop codes looked up concurrently per chunk.
    pub chunk_size: usize,

    /// Upper bound on in-flight lookups across all concurrent batches.
    pub max_in_flight: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            max_in_flight: CHUNK_SIZE,
        }
    }
}

/// Fans a list of stop codes out through the arrival cache.
///
/// Chunks run one after another; inside a chunk every lookup runs
/// concurrently and the chunk finishes only once each lookup has settled.
/// A failing stop code becomes a `Failure` record and never cancels its
/// siblings.
pub struct BatchOrchestrator<U> {
    cache: Arc<ArrivalCache<U>>,
    chunk_size: usize,
    permits: Arc<Semaphore>,
}

impl<U: TransitApi> BatchOrchestrator<U> {
    pub fn new(cache: Arc<ArrivalCache<U>>, config: BatchConfig) -> Self {
        Self {
            cache,
            chunk_size: config.chunk_size.max(1),
            permits: Arc::new(Semaphore::new(config.max_in_flight.max(1))),
        }
    }

    /// Look up arrivals for every stop code.
    ///
    /// Results are returned in the same order as the input codes. Only
    /// malformed input is an error, and it is reported before any upstream
    /// call is made.
    pub async fn run(
        &self,
        stop_codes: &[String],
        api_key: &ApiKey,
    ) -> Result<Vec<BatchItem>, InputError> {
        let codes = validate(stop_codes)?;

        let mut results = Vec::with_capacity(codes.len());
        for chunk in codes.chunks(self.chunk_size) {
            let lookups: Vec<_> = chunk
                .iter()
                .map(|code| self.lookup(code, api_key))
                .collect();
            results.extend(join_all(lookups).await);
        }

        let failed = results.iter().filter(|r| !r.outcome.is_success()).count();
        debug!(total = results.len(), failed, "batch lookup finished");

        Ok(results)
    }

    async fn lookup(&self, code: &StopCode, api_key: &ApiKey) -> BatchItem {
        let outcome = match self.permits.acquire().await {
            Ok(_permit) => match self.cache.get(code, api_key).await {
                Ok(arrival) => ArrivalOutcome::Success {
                    payload: arrival.payload,
                    was_cached: arrival.was_cached,
                },
                Err(e) => {
                    debug!(stop_code = %code, error = %e, "batch item failed");
                    ArrivalOutcome::Failure {
                        message: e.to_string(),
                    }
                }
            },
            Err(_) => ArrivalOutcome::Failure {
                message: "batch executor closed".to_string(),
            },
        };

        BatchItem {
            stop_code: code.clone(),
            outcome,
        }
    }
}

/// Check batch shape and parse every code.
pub fn validate(stop_codes: &[String]) -> Result<Vec<StopCode>, InputError> {
    if stop_codes.is_empty() {
        return Err(InputError::EmptyBatch);
    }

    if stop_codes.len() > MAX_BATCH_SIZE {
        return Err(InputError::BatchTooLarge {
            size: stop_codes.len(),
            max: MAX_BATCH_SIZE,
        });
    }

    stop_codes
        .iter()
        .enumerate()
        .map(|(index, code)| {
            StopCode::parse(code).map_err(|_| InputError::InvalidStopCode { index })
        })
        .collect()
}
