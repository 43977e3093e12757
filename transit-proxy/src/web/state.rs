//! Application state for the web layer.

use std::sync::Arc;

use crate::proxy::TransitProxy;

/// Shared application state.
///
/// Handlers get the proxy injected through axum's `State` extractor rather
/// than reaching for a global.
pub struct AppState<U> {
    /// The caching proxy
    pub proxy: Arc<TransitProxy<U>>,
}

impl<U> AppState<U> {
    /// Create a new app state.
    pub fn new(proxy: TransitProxy<U>) -> Self {
        Self {
            proxy: Arc::new(proxy),
        }
    }
}

// Manual impl: `U` itself does not need to be `Clone`.
impl<U> Clone for AppState<U> {
    fn clone(&self) -> Self {
        Self {
            proxy: self.proxy.clone(),
        }
    }
}
