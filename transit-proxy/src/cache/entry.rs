//! Timestamped cache values.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// A cached value plus the moment it was fetched from upstream.
///
/// Staleness is checked lazily by readers: an entry is stale once
/// `now - fetched_at >= ttl`.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub value: T,
    pub fetched_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    /// Wrap a value fetched just now.
    pub fn new(value: T) -> Self {
        Self::fetched_at(value, Utc::now())
    }

    /// Wrap a value fetched at a known time.
    pub fn fetched_at(value: T, fetched_at: DateTime<Utc>) -> Self {
        Self { value, fetched_at }
    }

    /// Age of the entry at `now`. Clock skew into the past counts as zero.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.fetched_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Whether the entry has outlived `ttl` at `now`.
    pub fn is_stale_at(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.age_at(now) >= ttl
    }

    /// Whether the entry has outlived `ttl` as of the current time.
    pub fn is_stale(&self, ttl: Duration) -> bool {
        self.is_stale_at(ttl, Utc::now())
    }
}
