use std::sync::Arc;

use crate::{
    access_log::AccessLog,
    cache::UserCache,
    config::Config,
    store::{MemoryUserStore, UserStore},
};

/// Shared application state injected into every request handler via [`axum::extract::State`].
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn UserStore>,
    pub cache: UserCache,
    pub access_log: AccessLog,
}

impl AppState {
    pub fn new(config: Arc<Config>, store: Arc<dyn UserStore>, access_log: AccessLog) -> Self {
        let cache = UserCache::new(config.users.cache_ttl());
        Self {
            config,
            store,
            cache,
            access_log,
        }
    }

    /// State backed by an empty in-memory store, with access logging disabled.
    #[cfg(test)]
    pub fn for_tests(config: Config) -> Arc<Self> {
        Arc::new(Self::new(
            Arc::new(config),
            Arc::new(MemoryUserStore::new()),
            AccessLog::disabled(),
        ))
    }

    /// Build the production state: in-memory store plus the configured log sinks.
    pub async fn from_config(config: Arc<Config>) -> anyhow::Result<Self> {
        let access_log = AccessLog::open(&config.access_log).await?;
        let store: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
        Ok(Self::new(config, store, access_log))
    }
}
