//! Caching proxy for a transit real-time arrival API.
//!
//! Callers ask for bus arrivals at one or many stops. Responses are cached
//! briefly per stop and enriched with the stop's display name, taken from
//! a long-lived directory of every stop the upstream knows about.

pub mod batch;
pub mod cache;
pub mod config;
pub mod directory;
pub mod domain;
pub mod error;
pub mod proxy;
pub mod upstream;
pub mod web;
