//! Upstream transit API HTTP client.
//!
//! Provides async methods for the two upstream endpoints the proxy needs:
//! the paginated bus stop listing and the live arrivals lookup. The caller's
//! key is forwarded on every request; the client itself holds no credential.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderValue};
use serde_json::Value;

use crate::domain::{ApiKey, StopCode};

use super::error::UpstreamError;
use super::types::{StopsEnvelope, StopsPage};

/// Default base URL for the upstream API.
pub const DEFAULT_BASE_URL: &str = "https://datamall2.mytransport.sg/ltaodataservice";

/// Header carrying the caller-supplied key.
const API_KEY_HEADER: &str = "AccountKey";

/// Upstream bodies quoted in decode errors are cut to this many characters.
const MAX_QUOTED_BODY: usize = 500;

/// The operations the caches need from the upstream.
///
/// Implemented by [`TransitClient`] for production and by
/// [`MockTransitApi`](super::MockTransitApi) for tests.
pub trait TransitApi: Send + Sync {
    /// Fetch one page of the stop listing starting at `offset`.
    fn fetch_stops_page(
        &self,
        api_key: &ApiKey,
        offset: usize,
    ) -> impl Future<Output = Result<StopsPage, UpstreamError>> + Send;

    /// Fetch live arrivals for one stop, as an opaque JSON document.
    fn fetch_arrival(
        &self,
        api_key: &ApiKey,
        stop_code: &StopCode,
    ) -> impl Future<Output = Result<Value, UpstreamError>> + Send;
}

/// Configuration for the upstream client.
#[derive(Debug, Clone)]
pub struct TransitClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl TransitClientConfig {
    /// Create a config pointing at the production API.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for TransitClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Upstream transit API client.
#[derive(Debug, Clone)]
pub struct TransitClient {
    http: reqwest::Client,
    base_url: String,
}

impl TransitClient {
    /// Create a new client with the given configuration.
    pub fn new(config: TransitClientConfig) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Issue an authenticated GET and return the body of a successful response.
    async fn get(
        &self,
        api_key: &ApiKey,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<String, UpstreamError> {
        let key =
            HeaderValue::from_str(api_key.expose()).map_err(|_| UpstreamError::InvalidApiKey)?;

        let url = format!("{}/{}", self.base_url, path);

        let response = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, key)
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.text().await?)
    }
}

impl TransitApi for TransitClient {
    async fn fetch_stops_page(
        &self,
        api_key: &ApiKey,
        offset: usize,
    ) -> Result<StopsPage, UpstreamError> {
        let body = self
            .get(api_key, "BusStops", &[("$skip", offset.to_string())])
            .await?;

        let envelope: StopsEnvelope =
            serde_json::from_str(&body).map_err(|e| decode_error(e, &body))?;

        Ok(StopsPage::from_items(envelope.value))
    }

    async fn fetch_arrival(
        &self,
        api_key: &ApiKey,
        stop_code: &StopCode,
    ) -> Result<Value, UpstreamError> {
        let body = self
            .get(
                api_key,
                "v3/BusArrival",
                &[("BusStopCode", stop_code.as_str().to_string())],
            )
            .await?;

        serde_json::from_str(&body).map_err(|e| decode_error(e, &body))
    }
}

fn decode_error(err: serde_json::Error, body: &str) -> UpstreamError {
    UpstreamError::Decode {
        message: err.to_string(),
        body: Some(body.chars().take(MAX_QUOTED_BODY).collect()),
    }
}
