//! Bus stop reference directory.
//!
//! Provides stop code → display name mapping, built by paginating through
//! the upstream stop listing on first demand and rebuilt once a day.

mod reference;
mod snapshot;

pub use reference::{DirectoryConfig, DirectoryStatus, REFERENCE_TTL, ReferenceDirectory};
pub use snapshot::{ReferenceSnapshot, StopIndex};
