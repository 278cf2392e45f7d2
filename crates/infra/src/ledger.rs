//! Lot ledger: the single entry point for mutating lot quantities.
//!
//! ```text
//! RegisterEntry / RegisterExit
//!   ↓
//! 1. Validate the command (pure, no IO)
//!   ↓
//! 2. Store transaction: lock / check / mutate lot + append movement
//!   ↓
//! 3. Commit (or roll back and surface the triggering error)
//! ```

use tracing::{info, instrument, warn};

use medistock_core::DomainError;
use medistock_inventory::{EntryReceipt, ExitReceipt, RegisterEntry, RegisterExit};

use crate::error::{StoreError, StoreResult};
use crate::store::InventoryStore;

#[derive(Debug, Clone)]
pub struct LotLedger<S> {
    store: S,
}

impl<S> LotLedger<S>
where
    S: InventoryStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Receive stock as a new lot, paired with one ENTRY movement.
    #[instrument(skip(self, cmd), fields(product_id = %cmd.product_id, actor = %cmd.actor), err)]
    pub async fn register_entry(&self, cmd: RegisterEntry) -> StoreResult<EntryReceipt> {
        let receipt = cmd.into_receipt()?;
        let receipt = self.store.record_entry(receipt).await?;

        info!(
            lot_id = %receipt.new_lot.id,
            lot_number = %receipt.new_lot.lot_number,
            quantity = receipt.new_lot.initial_quantity,
            "stock entry registered"
        );
        Ok(receipt)
    }

    /// Consume stock from one lot, paired with one EXIT movement.
    #[instrument(skip(self, cmd), fields(lot_id = %cmd.stock_lot_id, actor = %cmd.actor), err)]
    pub async fn register_exit(&self, cmd: RegisterExit) -> StoreResult<ExitReceipt> {
        cmd.validate()?;
        let requested = cmd.quantity;

        let result = self.store.record_exit(cmd).await;
        match &result {
            Ok(receipt) => info!(
                product_id = %receipt.updated_lot.product_id,
                quantity = requested,
                remaining = receipt.updated_lot.current_quantity,
                "stock exit registered"
            ),
            Err(StoreError::Domain(DomainError::InsufficientStock {
                lot_number,
                available,
                ..
            })) => warn!(%lot_number, available, requested, "stock exit rejected"),
            Err(_) => {}
        }
        result
    }
}
