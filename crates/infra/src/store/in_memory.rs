use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use medistock_core::{DomainError, Entity, ProductId, StockLotId};
use medistock_inventory::{
    EntryReceipt, ExitReceipt, MovementFilter, RegisterExit, StockLot, StockMovement,
};
use medistock_products::Product;

use super::InventoryStore;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Default)]
struct State {
    products: BTreeMap<ProductId, Product>,
    lots: HashMap<StockLotId, StockLot>,
    /// Append-only, in commit order.
    movements: Vec<StockMovement>,
}

/// In-memory inventory store for tests/dev.
///
/// Each mutating call holds the write lock for its whole body, which makes it
/// atomic and serializes concurrent exits. Domain checks run against copies,
/// and state is only written back once every check has passed.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    state: RwLock<State>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| StoreError::database("in_memory.read", "state lock poisoned"))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| StoreError::database("in_memory.write", "state lock poisoned"))
    }
}

fn missing<E: Entity>() -> StoreError {
    DomainError::not_found(E::kind()).into()
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn insert_product(&self, product: Product) -> StoreResult<Product> {
        let mut state = self.write()?;
        if state.products.values().any(|p| p.sku == product.sku) {
            return Err(DomainError::conflict("a product with this sku already exists").into());
        }
        state.products.insert(product.id(), product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.read()?.products.get(&id).cloned())
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        Ok(self.read()?.products.values().cloned().collect())
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let mut state = self.write()?;
        let product = state.products.get(&id).ok_or_else(missing::<Product>)?;

        let movement_count = state.movements.iter().filter(|m| m.product_id == id).count() as u64;
        product.ensure_deletable(movement_count)?;

        state.lots.retain(|_, lot| lot.product_id != id);
        state.products.remove(&id);
        Ok(())
    }

    async fn record_entry(&self, receipt: EntryReceipt) -> StoreResult<EntryReceipt> {
        let mut state = self.write()?;
        if !state.products.contains_key(&receipt.new_lot.product_id) {
            return Err(missing::<Product>());
        }
        state.lots.insert(receipt.new_lot.id(), receipt.new_lot.clone());
        state.movements.push(receipt.movement.clone());
        Ok(receipt)
    }

    async fn record_exit(&self, cmd: RegisterExit) -> StoreResult<ExitReceipt> {
        let mut state = self.write()?;
        let mut lot = state
            .lots
            .get(&cmd.stock_lot_id)
            .cloned()
            .ok_or_else(missing::<StockLot>)?;

        let movement = lot.apply_exit(&cmd)?;

        state.lots.insert(lot.id(), lot.clone());
        state.movements.push(movement.clone());
        Ok(ExitReceipt {
            updated_lot: lot,
            movement,
        })
    }

    async fn get_lot(&self, id: StockLotId) -> StoreResult<Option<StockLot>> {
        Ok(self.read()?.lots.get(&id).cloned())
    }

    async fn active_lots(&self, product_id: Option<ProductId>) -> StoreResult<Vec<StockLot>> {
        Ok(self
            .read()?
            .lots
            .values()
            .filter(|l| l.is_active())
            .filter(|l| product_id.is_none_or(|p| p == l.product_id))
            .cloned()
            .collect())
    }

    async fn list_movements(&self, filter: MovementFilter) -> StoreResult<Vec<StockMovement>> {
        Ok(self
            .read()?
            .movements
            .iter()
            .rev()
            .filter(|m| filter.matches(m))
            .take(filter.limit)
            .cloned()
            .collect())
    }
}
