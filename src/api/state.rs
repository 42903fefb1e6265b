use std::sync::Arc;
use std::time::Duration;

use crate::api::cache::SnapshotCache;
use crate::config::{AnalyticsConfig, AppConfig, ConfigError};
use crate::models::TimeWindowSnapshot;
use crate::storage::{LoadError, PeriodDataLoader};

#[derive(Clone)]
pub struct AppState {
    pub loader: Arc<PeriodDataLoader>,
    pub cache: Arc<SnapshotCache>,
    pub analytics: Arc<AnalyticsConfig>,
    pub cors_origin: String,
}

impl AppState {
    pub fn new(loader: PeriodDataLoader, analytics: AnalyticsConfig, cache_ttl: Duration) -> Self {
        Self {
            loader: Arc::new(loader),
            cache: Arc::new(SnapshotCache::new(cache_ttl)),
            analytics: Arc::new(analytics),
            cors_origin: "*".to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let mut state = Self::new(
            config.loader(),
            config.analytics.clone(),
            config.analytics.cache_ttl()?,
        );
        state.cors_origin = config.server.cors_origin.clone();
        Ok(state)
    }

    /// Snapshot for `key`, through the cache.
    pub async fn snapshot(&self, key: &str) -> Result<Arc<TimeWindowSnapshot>, LoadError> {
        let loader = Arc::clone(&self.loader);
        self.cache
            .get_or_load(key, move || loader.load_period(key))
            .await
    }
}
