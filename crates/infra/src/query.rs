//! Stock query service: read-only views over ledger state.

use tracing::instrument;

use medistock_core::{DomainError, ProductId};
use medistock_inventory::{MovementFilter, StockLot, StockMovement, available_lots};
use medistock_products::{ProductDetails, ProductStockSummary, summarize};

use crate::error::StoreResult;
use crate::store::InventoryStore;

#[derive(Debug, Clone)]
pub struct StockQueryService<S> {
    store: S,
}

impl<S> StockQueryService<S>
where
    S: InventoryStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Per-product totals over active lots, sorted by name.
    #[instrument(skip(self), err)]
    pub async fn product_stock_summary(&self) -> StoreResult<Vec<ProductStockSummary>> {
        let products = self.store.list_products().await?;
        let lots = self.store.active_lots(None).await?;
        Ok(summarize(&products, &lots))
    }

    /// Products whose total is below their minimum stock level.
    pub async fn low_stock(&self) -> StoreResult<Vec<ProductStockSummary>> {
        Ok(self
            .product_stock_summary()
            .await?
            .into_iter()
            .filter(|row| row.below_minimum)
            .collect())
    }

    /// Active lots for a product in FEFO order. Unknown products yield an empty list.
    #[instrument(skip_all, fields(product_id = %product_id), err)]
    pub async fn available_lots(&self, product_id: ProductId) -> StoreResult<Vec<StockLot>> {
        let lots = self.store.active_lots(Some(product_id)).await?;
        Ok(available_lots(lots))
    }

    #[instrument(skip_all, fields(product_id = %product_id), err)]
    pub async fn product_details(&self, product_id: ProductId) -> StoreResult<ProductDetails> {
        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or_else(|| DomainError::not_found("product"))?;
        let lots = self.store.active_lots(Some(product_id)).await?;
        Ok(ProductDetails::new(product, lots))
    }

    pub async fn movements(&self, filter: MovementFilter) -> StoreResult<Vec<StockMovement>> {
        self.store.list_movements(filter).await
    }
}
