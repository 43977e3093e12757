//! The proxy's public entry points.
//!
//! `TransitProxy` owns both caches and the batch orchestrator and is shared
//! by the request handlers. It validates caller input, then delegates.

use std::sync::Arc;

use crate::batch::{BatchConfig, BatchItem, BatchOrchestrator};
use crate::cache::{ArrivalCache, CacheConfig, CachedArrival};
use crate::directory::{DirectoryConfig, ReferenceDirectory};
use crate::domain::{ApiKey, InputError, StopCode};
use crate::error::ProxyError;
use crate::upstream::{BusStop, TransitApi};

/// Caching proxy in front of a transit API.
pub struct TransitProxy<U> {
    directory: Arc<ReferenceDirectory<U>>,
    arrivals: Arc<ArrivalCache<U>>,
    batch: BatchOrchestrator<U>,
}

impl<U: TransitApi> TransitProxy<U> {
    /// Wire up the directory, arrival cache and batch orchestrator around
    /// one upstream client.
    pub fn new(
        upstream: Arc<U>,
        directory_config: DirectoryConfig,
        cache_config: &CacheConfig,
        batch_config: BatchConfig,
    ) -> Self {
        let directory = Arc::new(ReferenceDirectory::new(upstream.clone(), directory_config));
        let arrivals = Arc::new(ArrivalCache::new(
            upstream,
            directory.clone(),
            cache_config,
        ));
        let batch = BatchOrchestrator::new(arrivals.clone(), batch_config);

        Self {
            directory,
            arrivals,
            batch,
        }
    }

    /// Create a proxy with default TTLs and batch limits.
    pub fn with_defaults(upstream: Arc<U>) -> Self {
        Self::new(
            upstream,
            DirectoryConfig::default(),
            &CacheConfig::default(),
            BatchConfig::default(),
        )
    }

    /// Arrivals for one stop, enriched with its display name when known.
    pub async fn fetch_arrival(
        &self,
        stop_code: &str,
        api_key: &str,
    ) -> Result<CachedArrival, ProxyError> {
        let api_key = ApiKey::parse(api_key).map_err(InputError::from)?;
        let stop_code = StopCode::parse(stop_code).map_err(InputError::from)?;

        Ok(self.arrivals.get(&stop_code, &api_key).await?)
    }

    /// Arrivals for up to 50 stops. Individual failures are reported per
    /// item; only malformed input fails the call.
    pub async fn fetch_arrival_batch(
        &self,
        stop_codes: &[String],
        api_key: &str,
    ) -> Result<Vec<BatchItem>, ProxyError> {
        let api_key = ApiKey::parse(api_key).map_err(InputError::from)?;

        Ok(self.batch.run(stop_codes, &api_key).await?)
    }

    /// The directory record for one stop, if the directory knows it.
    pub async fn lookup_stop(
        &self,
        stop_code: &str,
        api_key: &str,
    ) -> Result<Option<BusStop>, ProxyError> {
        let api_key = ApiKey::parse(api_key).map_err(InputError::from)?;
        let stop_code = StopCode::parse(stop_code).map_err(InputError::from)?;

        Ok(self.directory.lookup(&api_key, stop_code.as_str()).await)
    }

    pub fn directory(&self) -> &ReferenceDirectory<U> {
        &self.directory
    }

    pub fn arrivals(&self) -> &ArrivalCache<U> {
        &self.arrivals
    }
}
