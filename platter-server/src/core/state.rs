//! Shared server state

use std::sync::Arc;

use crate::core::config::StoreBackend;
use crate::core::{Config, Result};
use crate::db::{DocumentStore, MemoryStore, RedbStore};
use crate::orders::{ORDERS_COLLECTION, OrderRepository, OrderService};

/// Cloned into every handler; all fields are cheap handles
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub orders: Arc<OrderService>,
}

impl ServerState {
    /// Open the configured store and wire the services on top of it
    pub async fn initialize(config: &Config) -> Result<Self> {
        let store: Arc<dyn DocumentStore> = match config.store_backend {
            StoreBackend::Redb => {
                std::fs::create_dir_all(&config.work_dir)?;
                let path = config.database_path();
                tracing::info!(path = %path.display(), "Opening redb store");
                Arc::new(RedbStore::open(&path, &[ORDERS_COLLECTION])?)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store, data will not survive a restart");
                Arc::new(MemoryStore::new())
            }
        };
        Ok(Self::with_store(config.clone(), store))
    }

    pub fn with_store(config: Config, store: Arc<dyn DocumentStore>) -> Self {
        let repo = OrderRepository::new(store.clone(), config.resilient_access());
        let orders = Arc::new(OrderService::new(repo, config.pricing()));
        Self {
            config,
            store,
            orders,
        }
    }

    /// Memory-backed state for tests and demos
    pub fn in_memory() -> Self {
        Self::with_store(Config::in_memory(), Arc::new(MemoryStore::new()))
    }
}
