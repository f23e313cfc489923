use std::sync::Arc;

use crate::auth::{CredentialVerifier, DemoDirectory};
use crate::config::AppConfig;
use crate::middleware::rate_limit::RateLimiter;
use crate::store::{ChartStore, MemoryStore};

/// Shared application state, constructed once at startup and injected into
/// the router. Holds every piece of cross-request mutable state (rate-limit
/// counters, the store) so tests get isolation by building their own.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn ChartStore>,
    pub credentials: Arc<dyn CredentialVerifier>,
    pub general_limiter: Arc<RateLimiter>,
    pub strict_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(config: AppConfig, store: Arc<dyn ChartStore>) -> Self {
        let general_limiter = Arc::new(RateLimiter::new(
            config.rate_limit.general_max,
            config.rate_limit.window_secs,
        ));
        let strict_limiter = Arc::new(RateLimiter::new(
            config.rate_limit.strict_max,
            config.rate_limit.window_secs,
        ));

        Self {
            config: Arc::new(config),
            store,
            credentials: Arc::new(DemoDirectory::new()),
            general_limiter,
            strict_limiter,
        }
    }
}
