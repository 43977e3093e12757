//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::error::ProxyError;
use crate::upstream::TransitApi;

use super::dto::{
    ArrivalQuery, BatchItemResult, BatchRequest, BatchResponse, DirectoryHealth, ErrorResponse,
    HealthResponse, arrival_body,
};
use super::state::AppState;

/// Request header carrying the caller's upstream API key.
pub const API_KEY_HEADER: &str = "AccountKey";

/// Response header reporting whether the arrival came from cache.
const CACHE_HEADER: HeaderName = HeaderName::from_static("x-cache");

/// Create the application router.
pub fn create_router<U: TransitApi + 'static>(state: AppState<U>) -> Router {
    Router::new()
        .route("/health", get(health::<U>))
        .route("/api/arrivals", get(arrival::<U>))
        .route("/api/arrivals/batch", post(arrival_batch::<U>))
        .route("/api/stops/:code", get(stop::<U>))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The caller's API key, or an empty string when the header is absent or
/// not valid UTF-8. Empty keys are rejected by the proxy itself.
fn api_key(headers: &HeaderMap) -> &str {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Health check endpoint.
async fn health<U: TransitApi + 'static>(State(state): State<AppState<U>>) -> Json<HealthResponse> {
    let directory = state.proxy.directory();

    Json(HealthResponse {
        status: "ok",
        cached_stops: state.proxy.arrivals().entry_count(),
        directory: DirectoryHealth {
            status: directory.status().await.as_str(),
            stops: directory.stop_count().await,
        },
    })
}

/// Arrivals for a single stop.
async fn arrival<U: TransitApi + 'static>(
    State(state): State<AppState<U>>,
    headers: HeaderMap,
    Query(query): Query<ArrivalQuery>,
) -> Result<Response, AppError> {
    let code = query.code.unwrap_or_default();
    let arrival = state.proxy.fetch_arrival(&code, api_key(&headers)).await?;

    let cache_status = if arrival.was_cached { "HIT" } else { "MISS" };
    info!(stop_code = %code, cache = cache_status, "served arrival");

    let headers = [(CACHE_HEADER, HeaderValue::from_static(cache_status))];
    Ok((headers, Json(arrival_body(arrival))).into_response())
}

/// Arrivals for up to 50 stops in one request.
async fn arrival_batch<U: TransitApi + 'static>(
    State(state): State<AppState<U>>,
    headers: HeaderMap,
    Json(req): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, AppError> {
    let items = state
        .proxy
        .fetch_arrival_batch(&req.codes, api_key(&headers))
        .await?;

    let failed = items.iter().filter(|item| !item.outcome.is_success()).count();
    info!(requested = req.codes.len(), failed, "served arrival batch");

    Ok(Json(BatchResponse {
        results: items.into_iter().map(BatchItemResult::from).collect(),
    }))
}

/// Directory record for one stop.
async fn stop<U: TransitApi + 'static>(
    State(state): State<AppState<U>>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Result<Response, AppError> {
    match state.proxy.lookup_stop(&code, api_key(&headers)).await? {
        Some(stop) => Ok(Json(stop).into_response()),
        None => Err(AppError::NotFound {
            message: format!("unknown stop code: {code}"),
        }),
    }
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Upstream { status: StatusCode, message: String },
}

impl From<ProxyError> for AppError {
    fn from(e: ProxyError) -> Self {
        match e {
            ProxyError::Input(_) => AppError::BadRequest {
                message: e.to_string(),
            },
            ProxyError::Upstream(_) => AppError::Upstream {
                status: StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::BAD_GATEWAY),
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Upstream { status, message } => (status, message),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), %message, "request failed");
        } else {
            warn!(status = status.as_u16(), %message, "request rejected");
        }

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
