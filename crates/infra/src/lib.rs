//! Infrastructure layer: persistence and the services that run over it.

pub mod catalog;
pub mod config;
pub mod error;
pub mod ledger;
pub mod query;
pub mod store;


pub use catalog::ProductCatalog;
pub use config::PostgresConfig;
pub use error::{StoreError, StoreResult};
pub use ledger::LotLedger;
pub use query::StockQueryService;
pub use store::{InMemoryInventoryStore, InventoryStore, PostgresInventoryStore};
