//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::db::OrderStore;
use crate::middleware::AuthGate;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// configuration, the order store and the auth gate.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    orders: Arc<dyn OrderStore>,
    gate: AuthGate,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - API configuration
    /// * `orders` - Order persistence
    /// * `gate` - Auth gate built for the configured mode
    #[must_use]
    pub fn new(config: ApiConfig, orders: Arc<dyn OrderStore>, gate: AuthGate) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                orders,
                gate,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the order store.
    #[must_use]
    pub fn orders(&self) -> &dyn OrderStore {
        self.inner.orders.as_ref()
    }

    /// Get a reference to the auth gate.
    #[must_use]
    pub fn gate(&self) -> &AuthGate {
        &self.inner.gate
    }
}
