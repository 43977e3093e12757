//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::batch::{ArrivalOutcome, BatchItem};
use crate::cache::CachedArrival;

/// Query for a single arrival lookup.
#[derive(Debug, Deserialize)]
pub struct ArrivalQuery {
    /// Stop code to look up
    pub code: Option<String>,
}

/// Request body for a batch lookup.
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    /// Stop codes, 1 to 50 of them
    #[serde(default)]
    pub codes: Vec<String>,
}

/// One stop in a batch response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemResult {
    pub stop_code: String,

    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub was_cached: Option<bool>,

    /// Arrival payload on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Error message on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<BatchItem> for BatchItemResult {
    fn from(item: BatchItem) -> Self {
        let stop_code = item.stop_code.into();
        match item.outcome {
            ArrivalOutcome::Success {
                payload,
                was_cached,
            } => Self {
                stop_code,
                success: true,
                was_cached: Some(was_cached),
                data: Some(payload),
                error: None,
            },
            ArrivalOutcome::Failure { message } => Self {
                stop_code,
                success: false,
                was_cached: None,
                data: None,
                error: Some(message),
            },
        }
    }
}

/// Response for a batch lookup.
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    /// One entry per requested code, in request order
    pub results: Vec<BatchItemResult>,
}

/// Body of a single arrival response.
///
/// Object payloads are returned as-is with `wasCached` and `fetchedAt`
/// added; anything else is wrapped under `data`.
pub fn arrival_body(arrival: CachedArrival) -> Value {
    let mut fields = match arrival.payload {
        Value::Object(fields) => fields,
        other => {
            let mut wrapper = Map::new();
            wrapper.insert("data".to_string(), other);
            wrapper
        }
    };
    fields.insert("wasCached".to_string(), Value::Bool(arrival.was_cached));
    fields.insert(
        "fetchedAt".to_string(),
        Value::String(arrival.fetched_at.to_rfc3339()),
    );
    Value::Object(fields)
}

/// Directory section of the health response.
#[derive(Debug, Serialize)]
pub struct DirectoryHealth {
    pub status: &'static str,
    pub stops: usize,
}

/// Response for the health endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub cached_stops: u64,
    pub directory: DirectoryHealth,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::domain::StopCode;

    #[test]
    fn success_item_serializes_camel_case() {
        let item = BatchItem {
            stop_code: StopCode::parse("83139").unwrap(),
            outcome: ArrivalOutcome::Success {
                payload: json!({"Services": []}),
                was_cached: true,
            },
        };

        let value = serde_json::to_value(BatchItemResult::from(item)).unwrap();

        assert_eq!(
            value,
            json!({
                "stopCode": "83139",
                "success": true,
                "wasCached": true,
                "data": {"Services": []}
            })
        );
    }

    #[test]
    fn failure_item_carries_error_only() {
        let item = BatchItem {
            stop_code: StopCode::parse("99999").unwrap(),
            outcome: ArrivalOutcome::Failure {
                message: "upstream error 404: nope".to_string(),
            },
        };

        let value = serde_json::to_value(BatchItemResult::from(item)).unwrap();

        assert_eq!(
            value,
            json!({
                "stopCode": "99999",
                "success": false,
                "error": "upstream error 404: nope"
            })
        );
    }

    #[test]
    fn arrival_body_merges_object_payload() {
        let body = arrival_body(CachedArrival {
            payload: json!({"BusStopCode": "83139"}),
            was_cached: false,
            fetched_at: Utc::now(),
        });

        assert_eq!(body["BusStopCode"], "83139");
        assert_eq!(body["wasCached"], false);
        assert!(body["fetchedAt"].is_string());
    }

    #[test]
    fn arrival_body_wraps_other_payloads() {
        let body = arrival_body(CachedArrival {
            payload: json!([1, 2]),
            was_cached: true,
            fetched_at: Utc::now(),
        });

        assert_eq!(body["data"], json!([1, 2]));
        assert_eq!(body["wasCached"], true);
    }

    #[test]
    fn batch_request_defaults_to_empty() {
        let req: BatchRequest = serde_json::from_str("{}").unwrap();
        assert!(req.codes.is_empty());
    }
}
