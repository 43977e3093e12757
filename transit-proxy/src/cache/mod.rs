//! Caching layer for upstream arrival responses.
//!
//! Arrival snapshots are cached per stop code for a short TTL. Time-to-live
//! is the only freshness rule: there is no sweep, and a stale entry is simply
//! replaced by the next successful fetch for that stop.

mod arrivals;
mod entry;

use std::time::Duration;

pub use arrivals::{ArrivalCache, ArrivalSnapshot, CachedArrival, DISPLAY_NAME_FIELD};
pub use entry::CacheEntry;

/// Default arrival TTL: 15 seconds.
pub const ARRIVAL_TTL: Duration = Duration::from_secs(15);

/// Configuration for the arrival cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached arrival snapshots.
    pub arrival_ttl: Duration,
}

impl CacheConfig {
    /// Set a custom arrival TTL.
    pub fn with_arrival_ttl(mut self, ttl: Duration) -> Self {
        self.arrival_ttl = ttl;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            arrival_ttl: ARRIVAL_TTL,
        }
    }
}
