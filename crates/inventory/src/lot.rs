use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use medistock_core::{DomainError, DomainResult, Entity, ProductId, StockLotId, UserId};

use crate::movement::{MovementType, StockMovement};

/// A discrete quantity of a product received at one time.
///
/// `initial_quantity` is fixed at creation. `current_quantity` only ever goes
/// down (via exits); new stock always arrives as a new lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLot {
    pub id: StockLotId,
    pub product_id: ProductId,
    pub lot_number: String,
    pub expiry_date: Option<NaiveDate>,
    pub initial_quantity: i64,
    pub current_quantity: i64,
    pub entry_date: DateTime<Utc>,
}

/// Lot lifecycle. There is no transition back to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LotState {
    Active,
    Exhausted,
}

impl Entity for StockLot {
    type Id = StockLotId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn kind() -> &'static str {
        "stock lot"
    }
}

impl StockLot {
    pub fn state(&self) -> LotState {
        if self.current_quantity > 0 {
            LotState::Active
        } else {
            LotState::Exhausted
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == LotState::Active
    }

    /// Check that `quantity` can be taken from this lot, returning the remainder.
    pub fn check_withdrawal(&self, quantity: i64) -> DomainResult<i64> {
        ensure_positive_quantity(quantity)?;
        if self.current_quantity < quantity {
            return Err(DomainError::insufficient_stock(
                self.lot_number.clone(),
                self.current_quantity,
                quantity,
            ));
        }
        Ok(self.current_quantity - quantity)
    }

    /// Apply an exit to this lot and produce the paired EXIT movement.
    ///
    /// On error the lot is left untouched.
    pub fn apply_exit(&mut self, cmd: &RegisterExit) -> DomainResult<StockMovement> {
        if cmd.stock_lot_id != self.id {
            return Err(DomainError::validation("exit targets a different lot"));
        }
        let remaining = self.check_withdrawal(cmd.quantity)?;
        self.current_quantity = remaining;

        Ok(StockMovement::record(
            MovementType::Exit,
            self,
            cmd.quantity,
            cmd.reason.as_deref(),
            cmd.actor,
            cmd.occurred_at,
        ))
    }
}

/// Command: RegisterEntry (receive stock as a new lot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterEntry {
    pub product_id: ProductId,
    pub lot_number: String,
    pub expiry_date: Option<NaiveDate>,
    pub quantity: i64,
    pub reason: Option<String>,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

impl RegisterEntry {
    pub fn validate(&self) -> DomainResult<()> {
        if self.lot_number.trim().is_empty() {
            return Err(DomainError::validation("lotNumber cannot be empty"));
        }
        ensure_positive_quantity(self.quantity)
    }

    /// Build the new lot and its ENTRY movement. Both must be persisted together.
    pub fn into_receipt(self) -> DomainResult<EntryReceipt> {
        self.validate()?;

        let lot = StockLot {
            id: StockLotId::new(),
            product_id: self.product_id,
            lot_number: self.lot_number.trim().to_string(),
            expiry_date: self.expiry_date,
            initial_quantity: self.quantity,
            current_quantity: self.quantity,
            entry_date: self.occurred_at,
        };
        let movement = StockMovement::record(
            MovementType::Entry,
            &lot,
            self.quantity,
            self.reason.as_deref(),
            self.actor,
            self.occurred_at,
        );

        Ok(EntryReceipt { new_lot: lot, movement })
    }
}

/// Command: RegisterExit (consume stock from one lot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterExit {
    pub stock_lot_id: StockLotId,
    pub quantity: i64,
    pub reason: Option<String>,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

impl RegisterExit {
    pub fn validate(&self) -> DomainResult<()> {
        ensure_positive_quantity(self.quantity)
    }
}

/// Result of a committed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryReceipt {
    pub new_lot: StockLot,
    pub movement: StockMovement,
}

/// Result of a committed exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitReceipt {
    pub updated_lot: StockLot,
    pub movement: StockMovement,
}

fn ensure_positive_quantity(quantity: i64) -> DomainResult<()> {
    if quantity <= 0 {
        return Err(DomainError::validation("quantity must be a positive integer"));
    }
    Ok(())
}
