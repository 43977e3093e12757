//! Stop directory with long-lived, best-effort refresh.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::domain::ApiKey;
use crate::upstream::{BusStop, PAGE_SIZE, TransitApi};

use super::snapshot::{ReferenceSnapshot, StopIndex};

/// Default directory TTL: 24 hours.
pub const REFERENCE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default cap on pages fetched in one rebuild.
const DEFAULT_MAX_PAGES: usize = 200;

/// Configuration for the stop directory.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// How long a snapshot remains valid.
    pub ttl: Duration,
    /// Stop paginating after this many pages even if the upstream keeps
    /// returning full pages.
    pub max_pages: usize,
}

impl DirectoryConfig {
    /// Create a config with the default TTL (24 hours).
    pub fn new() -> Self {
        Self {
            ttl: REFERENCE_TTL,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Set a custom TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the page cap.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Observable lifecycle of the directory.
///
/// `Absent -> Building -> Ready -> Stale -> Building -> Ready -> ...`
/// A rebuild always ends in `Ready`, never in an error state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryStatus {
    Absent,
    Building,
    Ready,
    Stale,
}

impl DirectoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectoryStatus::Absent => "absent",
            DirectoryStatus::Building => "building",
            DirectoryStatus::Ready => "ready",
            DirectoryStatus::Stale => "stale",
        }
    }
}

/// Process-wide stop directory, used to attach display names to arrivals.
///
/// Rebuilds are serialized: while one caller paginates through the upstream,
/// concurrent callers wait for it and then reuse its snapshot instead of
/// starting a second rebuild.
pub struct ReferenceDirectory<U> {
    upstream: Arc<U>,
    config: DirectoryConfig,
    snapshot: RwLock<Option<Arc<ReferenceSnapshot>>>,
    rebuild_lock: Mutex<()>,
    building: AtomicBool,
}

impl<U: TransitApi> ReferenceDirectory<U> {
    /// Create an empty directory. Nothing is fetched until first use.
    pub fn new(upstream: Arc<U>, config: DirectoryConfig) -> Self {
        Self {
            upstream,
            config,
            snapshot: RwLock::new(None),
            rebuild_lock: Mutex::new(()),
            building: AtomicBool::new(false),
        }
    }

    /// Get the current snapshot, rebuilding it first if absent or stale.
    ///
    /// Never fails: a rebuild that hits an upstream error keeps whatever it
    /// had collected so far, which may be nothing.
    pub async fn get_directory(&self, api_key: &ApiKey) -> Arc<ReferenceSnapshot> {
        if let Some(snapshot) = self.fresh_snapshot().await {
            return snapshot;
        }

        let _rebuild = self.rebuild_lock.lock().await;

        // Another caller may have finished a rebuild while we waited.
        if let Some(snapshot) = self.fresh_snapshot().await {
            debug!("directory rebuilt by concurrent caller");
            return snapshot;
        }

        let _building = BuildingGuard::enter(&self.building);
        let stops = self.fetch_all(api_key).await;
        let snapshot = Arc::new(ReferenceSnapshot::new(StopIndex::new(stops)));

        info!(stops = snapshot.value.len(), "stop directory rebuilt");

        *self.snapshot.write().await = Some(snapshot.clone());
        snapshot
    }

    /// Look up a stop's display name. A miss is `None`, never an error.
    pub async fn display_name(&self, api_key: &ApiKey, code: &str) -> Option<String> {
        let snapshot = self.get_directory(api_key).await;
        snapshot.value.description_of(code).map(str::to_string)
    }

    /// Look up a full stop record.
    pub async fn lookup(&self, api_key: &ApiKey, code: &str) -> Option<BusStop> {
        let snapshot = self.get_directory(api_key).await;
        snapshot.value.get(code).cloned()
    }

    /// Current lifecycle state, without triggering a rebuild.
    pub async fn status(&self) -> DirectoryStatus {
        if self.building.load(Ordering::SeqCst) {
            return DirectoryStatus::Building;
        }
        match self.snapshot.read().await.as_ref() {
            None => DirectoryStatus::Absent,
            Some(s) if s.is_stale(self.config.ttl) => DirectoryStatus::Stale,
            Some(_) => DirectoryStatus::Ready,
        }
    }

    /// Number of stops in the current snapshot (0 if absent).
    pub async fn stop_count(&self) -> usize {
        self.snapshot
            .read()
            .await
            .as_ref()
            .map_or(0, |s| s.value.len())
    }

    async fn fresh_snapshot(&self) -> Option<Arc<ReferenceSnapshot>> {
        let guard = self.snapshot.read().await;
        guard
            .as_ref()
            .filter(|s| !s.is_stale(self.config.ttl))
            .cloned()
    }

    /// Paginate through the stop listing, strictly one page at a time.
    async fn fetch_all(&self, api_key: &ApiKey) -> Vec<BusStop> {
        let mut stops = Vec::new();
        let mut offset = 0;

        for _ in 0..self.config.max_pages {
            match self.upstream.fetch_stops_page(api_key, offset).await {
                Ok(page) => {
                    let last = page.is_last_page || page.items.len() < PAGE_SIZE;
                    stops.extend(page.items);
                    if last {
                        return stops;
                    }
                    offset += PAGE_SIZE;
                }
                Err(e) => {
                    warn!(
                        offset,
                        collected = stops.len(),
                        error = %e,
                        "stop page fetch failed, keeping partial directory"
                    );
                    return stops;
                }
            }
        }

        warn!(
            max_pages = self.config.max_pages,
            collected = stops.len(),
            "stop listing did not end within page limit"
        );
        stops
    }
}

/// Clears the building flag even if the rebuild future is dropped.
struct BuildingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BuildingGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self { flag }
    }
}

impl Drop for BuildingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
