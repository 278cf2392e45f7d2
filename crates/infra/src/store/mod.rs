//! Transactional inventory persistence.
//!
//! Every mutating method is one atomic unit: implementations either commit all
//! of its writes or none of them, and surface the triggering error after
//! rolling back. Business rules are delegated to the domain crates
//! (`StockLot::apply_exit`, `Product::ensure_deletable`) from inside the
//! transaction so both backends enforce the same semantics.

use std::sync::Arc;

use async_trait::async_trait;

use medistock_core::{ProductId, StockLotId};
use medistock_inventory::{
    EntryReceipt, ExitReceipt, MovementFilter, RegisterExit, StockLot, StockMovement,
};
use medistock_products::Product;

use crate::error::StoreResult;

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryInventoryStore;
pub use postgres::PostgresInventoryStore;

#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Insert a product. Duplicate SKU → `Conflict`.
    async fn insert_product(&self, product: Product) -> StoreResult<Product>;

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>>;

    async fn list_products(&self) -> StoreResult<Vec<Product>>;

    /// Delete a product and its lots, unless any movement references it.
    ///
    /// Unknown id → `NotFound`; movement history → `Conflict`.
    async fn delete_product(&self, id: ProductId) -> StoreResult<()>;

    /// Persist a new lot and its ENTRY movement atomically.
    ///
    /// Unknown product → `NotFound`.
    async fn record_entry(&self, receipt: EntryReceipt) -> StoreResult<EntryReceipt>;

    /// Lock the lot, check sufficiency, decrement, and append the EXIT movement
    /// atomically. Concurrent exits on the same lot are serialized.
    ///
    /// Unknown lot → `NotFound`; overdraft → `InsufficientStock`.
    async fn record_exit(&self, cmd: RegisterExit) -> StoreResult<ExitReceipt>;

    async fn get_lot(&self, id: StockLotId) -> StoreResult<Option<StockLot>>;

    /// Lots with `current_quantity > 0`, optionally for one product. Order unspecified.
    async fn active_lots(&self, product_id: Option<ProductId>) -> StoreResult<Vec<StockLot>>;

    /// Movements matching the filter, newest first, at most `filter.limit`.
    async fn list_movements(&self, filter: MovementFilter) -> StoreResult<Vec<StockMovement>>;
}

#[async_trait]
impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    async fn insert_product(&self, product: Product) -> StoreResult<Product> {
        (**self).insert_product(product).await
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        (**self).get_product(id).await
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        (**self).list_products().await
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        (**self).delete_product(id).await
    }

    async fn record_entry(&self, receipt: EntryReceipt) -> StoreResult<EntryReceipt> {
        (**self).record_entry(receipt).await
    }

    async fn record_exit(&self, cmd: RegisterExit) -> StoreResult<ExitReceipt> {
        (**self).record_exit(cmd).await
    }

    async fn get_lot(&self, id: StockLotId) -> StoreResult<Option<StockLot>> {
        (**self).get_lot(id).await
    }

    async fn active_lots(&self, product_id: Option<ProductId>) -> StoreResult<Vec<StockLot>> {
        (**self).active_lots(product_id).await
    }

    async fn list_movements(&self, filter: MovementFilter) -> StoreResult<Vec<StockMovement>> {
        (**self).list_movements(filter).await
    }
}
