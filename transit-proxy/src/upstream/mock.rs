//! Mock upstream for testing without API access.
//!
//! Serves scripted stop pages and arrival payloads from memory, records how
//! often each endpoint was hit, and can inject failures and latency.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::domain::{ApiKey, StopCode};

use super::client::TransitApi;
use super::error::UpstreamError;
use super::types::{BusStop, PAGE_SIZE, StopsPage};

type PageScript = Result<Vec<BusStop>, UpstreamError>;

/// In-memory stand-in for the upstream API.
///
/// Pages are addressed by `offset / PAGE_SIZE`; offsets past the last
/// scripted page return an empty page. Unknown stop codes fail with a 404.
#[derive(Default)]
pub struct MockTransitApi {
    pages: RwLock<Vec<PageScript>>,
    arrivals: RwLock<HashMap<String, Result<Value, UpstreamError>>>,
    arrival_delay: RwLock<Duration>,
    page_calls: AtomicUsize,
    arrival_calls: RwLock<HashMap<String, usize>>,
    last_api_key: RwLock<Option<String>>,
    rejected_keys: RwLock<HashSet<String>>,
}

impl MockTransitApi {
    /// Create an empty mock: no stops, no arrivals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `stops` split into pages of `PAGE_SIZE`.
    pub fn with_stops(mut self, stops: Vec<BusStop>) -> Self {
        *self.pages.get_mut() = paginate(stops);
        self
    }

    /// Serve synthetic pages of the given sizes.
    ///
    /// Stops are numbered consecutively across pages: codes `S0`, `S1`, ...
    /// with descriptions `Stop 0`, `Stop 1`, ...
    pub fn with_page_sizes(mut self, sizes: &[usize]) -> Self {
        let mut next = 0;
        let pages = sizes
            .iter()
            .map(|&size| {
                let page = (next..next + size)
                    .map(|n| BusStop::new(format!("S{n}"), format!("Stop {n}")))
                    .collect();
                next += size;
                Ok(page)
            })
            .collect();
        *self.pages.get_mut() = pages;
        self
    }

    /// Make the page at `index` fail with `error`.
    pub fn with_page_failure(mut self, index: usize, error: UpstreamError) -> Self {
        let pages = self.pages.get_mut();
        if pages.len() <= index {
            pages.resize_with(index + 1, || Ok(Vec::new()));
        }
        pages[index] = Err(error);
        self
    }

    /// Serve `payload` for `stop_code`.
    pub fn with_arrival(mut self, stop_code: &str, payload: Value) -> Self {
        self.arrivals
            .get_mut()
            .insert(stop_code.to_string(), Ok(payload));
        self
    }

    /// Fail arrival lookups for `stop_code` with the given status and body.
    pub fn with_arrival_failure(mut self, stop_code: &str, status: u16, body: &str) -> Self {
        self.arrivals.get_mut().insert(
            stop_code.to_string(),
            Err(UpstreamError::Status {
                status,
                body: body.to_string(),
            }),
        );
        self
    }

    /// Answer arrival lookups made with `api_key` with a 401.
    pub fn with_rejected_key(mut self, api_key: &str) -> Self {
        self.rejected_keys.get_mut().insert(api_key.to_string());
        self
    }

    /// Delay every arrival response, so concurrent callers overlap.
    pub fn with_arrival_delay(mut self, delay: Duration) -> Self {
        *self.arrival_delay.get_mut() = delay;
        self
    }

    /// Replace the stop listing (e.g. to simulate an upstream recovering).
    pub async fn set_stops(&self, stops: Vec<BusStop>) {
        *self.pages.write().await = paginate(stops);
    }

    /// Replace the arrival payload served for `stop_code`.
    pub async fn set_arrival(&self, stop_code: &str, payload: Value) {
        self.arrivals
            .write()
            .await
            .insert(stop_code.to_string(), Ok(payload));
    }

    /// Number of stop page requests served so far.
    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    /// Number of arrival requests served for `stop_code`.
    pub async fn arrival_calls(&self, stop_code: &str) -> usize {
        self.arrival_calls
            .read()
            .await
            .get(stop_code)
            .copied()
            .unwrap_or(0)
    }

    /// Number of arrival requests served across all stop codes.
    pub async fn total_arrival_calls(&self) -> usize {
        self.arrival_calls.read().await.values().sum()
    }

    /// The key presented on the most recent request.
    pub async fn last_api_key(&self) -> Option<String> {
        self.last_api_key.read().await.clone()
    }

    async fn record_key(&self, api_key: &ApiKey) {
        *self.last_api_key.write().await = Some(api_key.expose().to_string());
    }
}

impl TransitApi for MockTransitApi {
    async fn fetch_stops_page(
        &self,
        api_key: &ApiKey,
        offset: usize,
    ) -> Result<StopsPage, UpstreamError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.record_key(api_key).await;

        let pages = self.pages.read().await;
        match pages.get(offset / PAGE_SIZE) {
            Some(Ok(items)) => Ok(StopsPage::from_items(items.clone())),
            Some(Err(e)) => Err(e.clone()),
            None => Ok(StopsPage::from_items(Vec::new())),
        }
    }

    async fn fetch_arrival(
        &self,
        api_key: &ApiKey,
        stop_code: &StopCode,
    ) -> Result<Value, UpstreamError> {
        *self
            .arrival_calls
            .write()
            .await
            .entry(stop_code.as_str().to_string())
            .or_insert(0) += 1;
        self.record_key(api_key).await;

        let delay = *self.arrival_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.rejected_keys.read().await.contains(api_key.expose()) {
            return Err(UpstreamError::Status {
                status: 401,
                body: "invalid AccountKey".to_string(),
            });
        }

        let arrivals = self.arrivals.read().await;
        match arrivals.get(stop_code.as_str()) {
            Some(result) => result.clone(),
            None => Err(UpstreamError::Status {
                status: 404,
                body: format!("no arrivals for stop {stop_code}"),
            }),
        }
    }
}

fn paginate(stops: Vec<BusStop>) -> Vec<PageScript> {
    stops
        .chunks(PAGE_SIZE)
        .map(|chunk| Ok(chunk.to_vec()))
        .collect()
}
