//! Product catalog service (the ledger's product dependency).

use chrono::Utc;
use tracing::{info, instrument};

use medistock_core::{DomainError, ProductId};
use medistock_products::{CreateProduct, Product};

use crate::error::StoreResult;
use crate::store::InventoryStore;

#[derive(Debug, Clone)]
pub struct ProductCatalog<S> {
    store: S,
}

impl<S> ProductCatalog<S>
where
    S: InventoryStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[instrument(skip(self, cmd), fields(sku = %cmd.sku), err)]
    pub async fn create_product(&self, cmd: CreateProduct) -> StoreResult<Product> {
        let product = cmd.into_product(ProductId::new(), Utc::now())?;
        let product = self.store.insert_product(product).await?;
        info!(product_id = %product.id, "product created");
        Ok(product)
    }

    pub async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let mut products = self.store.list_products().await?;
        products.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(products)
    }

    pub async fn get_product(&self, id: ProductId) -> StoreResult<Product> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| DomainError::not_found("product").into())
    }

    /// Delete a product that never took part in a movement (its lots go with it).
    #[instrument(skip_all, fields(product_id = %id), err)]
    pub async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        self.store.delete_product(id).await?;
        info!("product deleted");
        Ok(())
    }
}
