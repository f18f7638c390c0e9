//! Shared Application State
//!
//! One instance of each core component, created at process start and
//! handed to every handler. The components are independent subsystems;
//! nothing here lets one reach into another's table.

use std::sync::Arc;

use crate::auth::{LoginCodeRegistry, RateLimiter};
use crate::config::Config;
use crate::store::PersistentStore;

/// Handles to the core components, cloned into each request handler.
#[derive(Clone)]
pub struct AppState {
    /// Runtime configuration.
    pub config: Arc<Config>,
    /// File-backed document store.
    pub store: Arc<PersistentStore>,
    /// Login code registry.
    pub codes: Arc<LoginCodeRegistry>,
    /// Redemption throttle.
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Build the component set from configuration.
    pub fn new(config: Config) -> Self {
        let store = Arc::new(PersistentStore::new(config.db_file()));
        let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
        Self {
            config: Arc::new(config),
            store,
            codes: Arc::new(LoginCodeRegistry::new()),
            limiter,
        }
    }
}
