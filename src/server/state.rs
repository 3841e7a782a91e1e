//! Shared application state for the HTTP server.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::store::StatsCache;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cached LeetCode snapshot and its upstream.
    pub cache: Arc<StatsCache>,
    /// Effective runtime configuration.
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Creates new app state around an existing cache.
    pub fn new(cache: Arc<StatsCache>, config: AppConfig) -> Self {
        Self {
            cache,
            config: Arc::new(config),
        }
    }
}
