//! Store and mutator wiring.

use std::sync::Arc;
use std::time::Duration;

use stockpile_infra::{
    InMemoryInventoryStore, InventoryMutator, InventoryStore, PostgresInventoryStore, StoreError,
};

use crate::config::ApiConfig;

/// Store handle shared by all requests.
pub type SharedStore = Arc<dyn InventoryStore>;

/// Services shared by all handlers.
pub struct AppServices {
    mutator: InventoryMutator<SharedStore>,
    backend: &'static str,
    notice_dismiss: Duration,
}

impl AppServices {
    pub fn new(store: SharedStore, backend: &'static str, config: &ApiConfig) -> Self {
        Self {
            mutator: InventoryMutator::with_config(store, config.mutator),
            backend,
            notice_dismiss: config.notice_dismiss,
        }
    }

    /// In-memory store (dev/test).
    pub fn in_memory(config: &ApiConfig) -> Self {
        Self::new(Arc::new(InMemoryInventoryStore::new()), "in_memory", config)
    }

    pub fn mutator(&self) -> &InventoryMutator<SharedStore> {
        &self.mutator
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }

    pub fn notice_dismiss_ms(&self) -> u64 {
        u64::try_from(self.notice_dismiss.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Pick the store backend from configuration: Postgres when `DATABASE_URL`
/// is set, in-memory otherwise.
pub async fn build_services(config: &ApiConfig) -> Result<AppServices, StoreError> {
    match config.database_url.as_deref() {
        Some(url) => {
            let store = PostgresInventoryStore::connect(url).await?;
            tracing::info!(backend = "postgres", "inventory store connected");
            Ok(AppServices::new(Arc::new(store), "postgres", config))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory inventory store");
            Ok(AppServices::in_memory(config))
        }
    }
}
