//! HTTP adapter for the proxy.
//!
//! Exposes single and batch arrival lookups, stop lookups and a health
//! check as JSON endpoints.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{API_KEY_HEADER, AppError, create_router};
pub use state::AppState;
