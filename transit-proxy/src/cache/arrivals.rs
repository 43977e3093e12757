//! Short-lived per-stop arrival cache.
//!
//! Arrival data changes every few seconds, but clients poll far more often
//! than that. Each stop code maps to the latest upstream snapshot, served
//! until it is `ttl` old.
//!
//! Concurrent misses on the same stop code are coalesced: the first caller
//! runs the upstream fetch and everyone else waiting on that key gets its
//! result, so a burst of clients polling one stop costs one upstream call.
//! Only successes are shared across API keys. A waiter whose key differs
//! from the one that failed retries with its own key.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use moka::future::Cache as MokaCache;
use serde_json::Value;
use tracing::debug;

use crate::directory::ReferenceDirectory;
use crate::domain::{ApiKey, StopCode};
use crate::upstream::{TransitApi, UpstreamError};

use super::CacheConfig;
use super::entry::CacheEntry;

/// Field added to arrival payloads when the stop is in the directory.
pub const DISPLAY_NAME_FIELD: &str = "BusStopName";

/// The latest upstream arrival payload for one stop.
pub type ArrivalSnapshot = CacheEntry<Value>;

/// Result of an arrival lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedArrival {
    /// Upstream payload, enriched with a display name where available.
    pub payload: Value,
    /// `true` if served from cache rather than fetched by this call.
    pub was_cached: bool,
    /// When the payload was fetched from upstream.
    pub fetched_at: DateTime<Utc>,
}

/// Per-stop arrival cache in front of the upstream.
pub struct ArrivalCache<U> {
    upstream: Arc<U>,
    directory: Arc<ReferenceDirectory<U>>,
    entries: MokaCache<StopCode, Arc<ArrivalSnapshot>>,
}

/// An upstream failure tagged with the key that produced it.
#[derive(Debug)]
struct FetchFailure {
    api_key: ApiKey,
    error: UpstreamError,
}

impl<U: TransitApi> ArrivalCache<U> {
    /// Create a new cache with the given configuration.
    pub fn new(
        upstream: Arc<U>,
        directory: Arc<ReferenceDirectory<U>>,
        config: &CacheConfig,
    ) -> Self {
        let entries = MokaCache::builder()
            .time_to_live(config.arrival_ttl)
            .build();

        Self {
            upstream,
            directory,
            entries,
        }
    }

    /// Get arrivals for a stop, using the cache if the entry is fresh.
    ///
    /// On a miss the upstream is called and the (enriched) payload is stored,
    /// replacing any previous entry. Upstream failures are returned as-is and
    /// never cached.
    pub async fn get(
        &self,
        stop_code: &StopCode,
        api_key: &ApiKey,
    ) -> Result<CachedArrival, UpstreamError> {
        let init = async {
            self.fetch(stop_code, api_key)
                .await
                .map_err(|error| FetchFailure {
                    api_key: api_key.clone(),
                    error,
                })
        };

        let entry = match self.entries.entry_by_ref(stop_code).or_try_insert_with(init).await {
            Ok(entry) => entry,
            Err(failure) if failure.api_key == *api_key => return Err(failure.error.clone()),
            Err(failure) => {
                debug!(
                    stop_code = %stop_code,
                    error = %failure.error,
                    "shared fetch failed under another key, retrying"
                );
                return self.refetch(stop_code, api_key).await;
            }
        };

        let was_cached = !entry.is_fresh();
        debug!(stop_code = %stop_code, was_cached, "arrival lookup");

        Ok(to_arrival(&entry.into_value(), was_cached))
    }

    /// Fetch with the caller's own key outside the coalescing path, storing
    /// the result on success.
    async fn refetch(
        &self,
        stop_code: &StopCode,
        api_key: &ApiKey,
    ) -> Result<CachedArrival, UpstreamError> {
        let snapshot = self.fetch(stop_code, api_key).await?;
        self.entries.insert(stop_code.clone(), snapshot.clone()).await;
        Ok(to_arrival(&snapshot, false))
    }

    /// Approximate number of cached stops (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }

    async fn fetch(
        &self,
        stop_code: &StopCode,
        api_key: &ApiKey,
    ) -> Result<Arc<ArrivalSnapshot>, UpstreamError> {
        let mut payload = self.upstream.fetch_arrival(api_key, stop_code).await?;
        self.enrich(&mut payload, stop_code, api_key).await;
        Ok(Arc::new(ArrivalSnapshot::new(payload)))
    }

    /// Attach the stop's display name. Best effort: any miss leaves the
    /// payload untouched.
    async fn enrich(&self, payload: &mut Value, stop_code: &StopCode, api_key: &ApiKey) {
        let Some(fields) = payload.as_object_mut() else {
            debug!(stop_code = %stop_code, "arrival payload is not an object, skipping name");
            return;
        };

        match self.directory.display_name(api_key, stop_code.as_str()).await {
            Some(name) => {
                fields.insert(DISPLAY_NAME_FIELD.to_string(), Value::String(name));
            }
            None => debug!(stop_code = %stop_code, "stop not in directory, no display name"),
        }
    }
}

fn to_arrival(snapshot: &ArrivalSnapshot, was_cached: bool) -> CachedArrival {
    CachedArrival {
        payload: snapshot.value.clone(),
        was_cached,
        fetched_at: snapshot.fetched_at,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::directory::DirectoryConfig;
    use crate::upstream::{BusStop, MockTransitApi};

    fn key() -> ApiKey {
        ApiKey::parse("test-key").unwrap()
    }

    fn code(s: &str) -> StopCode {
        StopCode::parse(s).unwrap()
    }

    fn cache_with(
        mock: MockTransitApi,
        config: CacheConfig,
    ) -> (Arc<MockTransitApi>, ArrivalCache<MockTransitApi>) {
        let mock = Arc::new(mock);
        let directory = Arc::new(ReferenceDirectory::new(
            mock.clone(),
            DirectoryConfig::default(),
        ));
        let cache = ArrivalCache::new(mock.clone(), directory, &config);
        (mock, cache)
    }

    fn mock_83139() -> MockTransitApi {
        MockTransitApi::new()
            .with_stops(vec![BusStop::new("83139", "Blk 6")])
            .with_arrival("83139", json!({"BusStopCode": "83139", "Services": []}))
    }

    #[tokio::test]
    async fn second_call_within_ttl_is_cached() {
        let (mock, cache) = cache_with(mock_83139(), CacheConfig::default());

        let first = cache.get(&code("83139"), &key()).await.unwrap();
        // Upstream changes, but the cached snapshot is still fresh.
        mock.set_arrival("83139", json!({"Services": ["new"]})).await;
        let second = cache.get(&code("83139"), &key()).await.unwrap();

        assert!(!first.was_cached);
        assert!(second.was_cached);
        assert_eq!(first.payload, second.payload);
        assert_eq!(first.fetched_at, second.fetched_at);
        assert_eq!(mock.arrival_calls("83139").await, 1);
    }

    #[tokio::test]
    async fn expired_entry_triggers_one_refetch() {
        let config = CacheConfig::default().with_arrival_ttl(Duration::from_millis(100));
        let (mock, cache) = cache_with(mock_83139(), config);

        let first = cache.get(&code("83139"), &key()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        let second = cache.get(&code("83139"), &key()).await.unwrap();
        let third = cache.get(&code("83139"), &key()).await.unwrap();

        assert!(!second.was_cached);
        assert!(second.fetched_at > first.fetched_at);
        assert!(third.was_cached);
        assert_eq!(mock.arrival_calls("83139").await, 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let mock = MockTransitApi::new().with_arrival_failure("83139", 503, "busy");
        let (mock, cache) = cache_with(mock, CacheConfig::default());

        let err = cache.get(&code("83139"), &key()).await.unwrap_err();
        assert_eq!(
            err,
            UpstreamError::Status {
                status: 503,
                body: "busy".to_string()
            }
        );

        mock.set_arrival("83139", json!({"Services": []})).await;
        let ok = cache.get(&code("83139"), &key()).await.unwrap();

        assert!(!ok.was_cached);
        assert_eq!(mock.arrival_calls("83139").await, 2);
    }

    #[tokio::test]
    async fn known_stop_gains_display_name() {
        let (_mock, cache) = cache_with(mock_83139(), CacheConfig::default());

        let arrival = cache.get(&code("83139"), &key()).await.unwrap();

        assert_eq!(arrival.payload[DISPLAY_NAME_FIELD], "Blk 6");
        assert_eq!(arrival.payload["BusStopCode"], "83139");
    }

    #[tokio::test]
    async fn cached_payload_keeps_display_name() {
        let (_mock, cache) = cache_with(mock_83139(), CacheConfig::default());

        cache.get(&code("83139"), &key()).await.unwrap();
        let cached = cache.get(&code("83139"), &key()).await.unwrap();

        assert!(cached.was_cached);
        assert_eq!(cached.payload[DISPLAY_NAME_FIELD], "Blk 6");
    }

    #[tokio::test]
    async fn unknown_stop_payload_is_unmodified() {
        let payload = json!({"BusStopCode": "11111", "Services": [{"ServiceNo": "15"}]});
        let mock = MockTransitApi::new()
            .with_stops(vec![BusStop::new("83139", "Blk 6")])
            .with_arrival("11111", payload.clone());
        let (_mock, cache) = cache_with(mock, CacheConfig::default());

        let arrival = cache.get(&code("11111"), &key()).await.unwrap();

        assert_eq!(arrival.payload, payload);
    }

    #[tokio::test]
    async fn directory_outage_does_not_fail_arrival() {
        let payload = json!({"Services": []});
        let mock = MockTransitApi::new()
            .with_page_failure(
                0,
                UpstreamError::Transport {
                    message: "connection reset".to_string(),
                },
            )
            .with_arrival("83139", payload.clone());
        let (_mock, cache) = cache_with(mock, CacheConfig::default());

        let arrival = cache.get(&code("83139"), &key()).await.unwrap();

        assert_eq!(arrival.payload, payload);
    }

    #[tokio::test]
    async fn non_object_payload_passes_through() {
        let mock = MockTransitApi::new()
            .with_stops(vec![BusStop::new("83139", "Blk 6")])
            .with_arrival("83139", json!([1, 2, 3]));
        let (_mock, cache) = cache_with(mock, CacheConfig::default());

        let arrival = cache.get(&code("83139"), &key()).await.unwrap();

        assert_eq!(arrival.payload, json!([1, 2, 3]));
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_fetch() {
        let mock = mock_83139().with_arrival_delay(Duration::from_millis(50));
        let (mock, cache) = cache_with(mock, CacheConfig::default());
        let stop = code("83139");

        let key = key();

        let (a, b) = tokio::join!(cache.get(&stop, &key), cache.get(&stop, &key));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(mock.arrival_calls("83139").await, 1);
        assert_eq!(a.payload, b.payload);
        // Exactly one caller performed the fetch.
        assert!(a.was_cached != b.was_cached);
    }

    #[tokio::test]
    async fn invalidate_all_forces_refetch() {
        let (mock, cache) = cache_with(mock_83139(), CacheConfig::default());

        cache.get(&code("83139"), &key()).await.unwrap();
        cache.invalidate_all();
        let again = cache.get(&code("83139"), &key()).await.unwrap();

        assert!(!again.was_cached);
        assert_eq!(mock.arrival_calls("83139").await, 2);
    }

    #[tokio::test]
    async fn failure_under_one_key_is_not_shared_with_another() {
        let mock = mock_83139()
            .with_rejected_key("revoked")
            .with_arrival_delay(Duration::from_millis(50));
        let (mock, cache) = cache_with(mock, CacheConfig::default());
        let stop = code("83139");
        let revoked = ApiKey::parse("revoked").unwrap();
        let valid = key();

        let (bad, good) = tokio::join!(cache.get(&stop, &revoked), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            cache.get(&stop, &valid).await
        });

        assert_eq!(bad.unwrap_err().status(), Some(401));
        let good = good.unwrap();
        assert!(!good.was_cached);
        assert_eq!(good.payload[DISPLAY_NAME_FIELD], "Blk 6");
        assert_eq!(mock.arrival_calls("83139").await, 2);

        // The successful retry is cached for everyone.
        let again = cache.get(&stop, &revoked).await.unwrap();
        assert!(again.was_cached);
    }

    #[tokio::test]
    async fn failure_is_shared_between_callers_with_the_same_key() {
        let mock = mock_83139()
            .with_rejected_key("revoked")
            .with_arrival_delay(Duration::from_millis(50));
        let (mock, cache) = cache_with(mock, CacheConfig::default());
        let stop = code("83139");
        let revoked = ApiKey::parse("revoked").unwrap();

        let (a, b) = tokio::join!(cache.get(&stop, &revoked), cache.get(&stop, &revoked));

        assert_eq!(a.unwrap_err().status(), Some(401));
        assert_eq!(b.unwrap_err().status(), Some(401));
        assert_eq!(mock.arrival_calls("83139").await, 1);
    }

    #[tokio::test]
    async fn many_stops_stay_cached_until_ttl() {
        let mut mock = MockTransitApi::new();
        let codes: Vec<StopCode> = (0..200).map(|n| code(&format!("{n:05}"))).collect();
        for stop in &codes {
            mock = mock.with_arrival(stop.as_str(), json!({"Services": []}));
        }
        let (mock, cache) = cache_with(mock, CacheConfig::default());
        let key = key();

        for _ in 0..3 {
            for stop in &codes {
                cache.get(stop, &key).await.unwrap();
            }
        }

        assert_eq!(mock.total_arrival_calls().await, codes.len());
    }
}
