use crate::config::Config;
use crate::observability::metrics::Metrics;
use crate::session::store::SessionStore;

pub struct AppState {
    pub store: SessionStore,
    pub metrics: Metrics,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            store: SessionStore::new(&config),
            metrics: Metrics::new(),
            config,
        }
    }
}
