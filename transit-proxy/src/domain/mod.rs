//! Domain types for the transit proxy.
//!
//! Validated identifiers and the caller-input error taxonomy. Anything that
//! receives a `StopCode` or `ApiKey` can trust it is non-empty.

mod api_key;
mod error;
mod stop_code;

pub use api_key::{ApiKey, MissingApiKey};
pub use error::InputError;
pub use stop_code::{InvalidStopCode, StopCode};
