//! Immutable stop directory snapshots.

use std::collections::HashMap;

use crate::cache::CacheEntry;
use crate::upstream::BusStop;

/// A complete stop listing with a by-code index.
///
/// Built once from the accumulated pages and never patched afterwards; a
/// refresh produces a whole new `StopIndex`.
#[derive(Debug, Clone, Default)]
pub struct StopIndex {
    stops: Vec<BusStop>,
    by_code: HashMap<String, usize>,
}

impl StopIndex {
    /// Index `stops` by code. On duplicate codes the first record wins.
    pub fn new(stops: Vec<BusStop>) -> Self {
        let mut by_code = HashMap::with_capacity(stops.len());
        for (i, stop) in stops.iter().enumerate() {
            by_code.entry(stop.code.clone()).or_insert(i);
        }
        Self { stops, by_code }
    }

    /// Look up a stop by exact, case-sensitive code.
    pub fn get(&self, code: &str) -> Option<&BusStop> {
        self.by_code.get(code).map(|&i| &self.stops[i])
    }

    /// The stop's description, if the code is known.
    pub fn description_of(&self, code: &str) -> Option<&str> {
        self.get(code).map(|s| s.description.as_str())
    }

    /// All stops, in upstream listing order.
    pub fn stops(&self) -> &[BusStop] {
        &self.stops
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}

/// The process-wide directory snapshot: a stop index plus its fetch time.
pub type ReferenceSnapshot = CacheEntry<StopIndex>;
