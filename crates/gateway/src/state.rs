//! Application state for dependency injection.

use std::sync::Arc;

use crate::clients::{CourseClient, LedgerClient};
use crate::config::GatewayConfig;
use crate::middleware::Cache;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<LedgerClient>,
    pub courses: Arc<CourseClient>,
    pub cache: Arc<Cache>,
    pub config: GatewayConfig,
}

impl AppState {
    /// Create new app state.
    pub fn new(
        ledger: Arc<LedgerClient>,
        courses: Arc<CourseClient>,
        cache: Arc<Cache>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            ledger,
            courses,
            cache,
            config,
        }
    }
}
