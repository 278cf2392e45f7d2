use std::sync::Arc;

use medistock_infra::{
    InMemoryInventoryStore, InventoryStore, LotLedger, PostgresInventoryStore, ProductCatalog,
    StockQueryService,
};

use crate::config::StorageConfig;

/// Type-erased store shared by every service.
pub type DynStore = Arc<dyn InventoryStore>;

/// Everything the handlers need, built once at startup.
pub struct AppServices {
    pub ledger: LotLedger<DynStore>,
    pub queries: StockQueryService<DynStore>,
    pub catalog: ProductCatalog<DynStore>,
}

impl AppServices {
    pub fn new(store: DynStore) -> Self {
        Self {
            ledger: LotLedger::new(store.clone()),
            queries: StockQueryService::new(store.clone()),
            catalog: ProductCatalog::new(store),
        }
    }

    /// In-memory wiring (dev/test).
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryInventoryStore::new()))
    }
}

pub async fn build_services(storage: &StorageConfig) -> anyhow::Result<AppServices> {
    match storage {
        StorageConfig::InMemory => {
            tracing::info!("using in-memory inventory store");
            Ok(AppServices::in_memory())
        }
        StorageConfig::Postgres(pg) => {
            let store = PostgresInventoryStore::connect(pg).await?;
            store.migrate().await?;
            tracing::info!(max_connections = pg.max_connections, "using postgres inventory store");
            Ok(AppServices::new(Arc::new(store)))
        }
    }
}
