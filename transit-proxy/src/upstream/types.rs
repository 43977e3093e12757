//! Upstream API response DTOs.
//!
//! Only the bus stop listing is modelled. Arrival responses are passed
//! through as opaque JSON, so upstream schema changes in the arrival payload
//! never break the proxy.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Number of records the upstream returns per stops page.
pub const PAGE_SIZE: usize = 500;

/// Envelope around every paginated listing: `{"value": [...]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct StopsEnvelope {
    pub value: Vec<BusStop>,
}

/// A bus stop record from the `BusStops` listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusStop {
    /// Unique stop code (e.g. "83139").
    #[serde(rename = "BusStopCode")]
    pub code: String,

    /// Human-readable name (e.g. "Opp Blk 19").
    #[serde(rename = "Description", default)]
    pub description: String,

    /// Everything else the upstream sends (road name, coordinates, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BusStop {
    /// Create a stop with no extra fields.
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            extra: Map::new(),
        }
    }
}

/// One page of the stop listing.
#[derive(Debug, Clone)]
pub struct StopsPage {
    pub items: Vec<BusStop>,
    /// A short page means the listing is exhausted.
    pub is_last_page: bool,
}

impl StopsPage {
    /// Build a page, deriving `is_last_page` from its length.
    pub fn from_items(items: Vec<BusStop>) -> Self {
        let is_last_page = items.len() < PAGE_SIZE;
        Self {
            items,
            is_last_page,
        }
    }
}
