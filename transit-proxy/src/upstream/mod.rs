//! Upstream transit API client.
//!
//! This module provides an HTTP client for the public transit API the proxy
//! sits in front of.
//!
//! Key characteristics of the upstream:
//! - The stop listing is **pagination-only**: 500 records per page, addressed
//!   by a `$skip` offset, with no total count. A short page marks the end.
//! - Every request carries the caller's key in the `AccountKey` header.
//! - Arrival payloads are treated as opaque JSON and passed through.

mod client;
mod error;
mod mock;
mod types;

pub use client::{DEFAULT_BASE_URL, TransitApi, TransitClient, TransitClientConfig};
pub use error::UpstreamError;
pub use mock::MockTransitApi;
pub use types::{BusStop, PAGE_SIZE, StopsEnvelope, StopsPage};
