use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use medistock_core::{DomainError, DomainResult, Entity, MovementId, ProductId, StockLotId, UserId};

use crate::lot::StockLot;

pub const DEFAULT_ENTRY_REASON: &str = "Stock entry";
pub const DEFAULT_EXIT_REASON: &str = "Stock exit";

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    Entry,
    Exit,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Entry => "ENTRY",
            MovementType::Exit => "EXIT",
        }
    }

    fn default_reason(&self) -> &'static str {
        match self {
            MovementType::Entry => DEFAULT_ENTRY_REASON,
            MovementType::Exit => DEFAULT_EXIT_REASON,
        }
    }
}

impl core::fmt::Display for MovementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for MovementType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ENTRY" => Ok(MovementType::Entry),
            "EXIT" => Ok(MovementType::Exit),
            other => Err(DomainError::validation(format!("unknown movement type '{other}'"))),
        }
    }
}

/// Immutable audit record of one quantity change against one lot.
///
/// Movements are only created alongside the lot mutation they describe and
/// are never updated or deleted afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: MovementId,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub quantity: i64,
    pub reason: String,
    pub product_id: ProductId,
    pub stock_lot_id: StockLotId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Entity for StockMovement {
    type Id = MovementId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn kind() -> &'static str {
        "stock movement"
    }
}

impl StockMovement {
    pub(crate) fn record(
        movement_type: MovementType,
        lot: &StockLot,
        quantity: i64,
        reason: Option<&str>,
        actor: UserId,
        at: DateTime<Utc>,
    ) -> Self {
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(movement_type.default_reason())
            .to_string();

        Self {
            id: MovementId::new(),
            movement_type,
            quantity,
            reason,
            product_id: lot.product_id,
            stock_lot_id: lot.id,
            user_id: actor,
            created_at: at,
        }
    }
}

/// Read-side filter for the movement history (newest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementFilter {
    pub product_id: Option<ProductId>,
    pub limit: usize,
}

impl MovementFilter {
    pub const DEFAULT_LIMIT: usize = 50;
    pub const MAX_LIMIT: usize = 500;

    /// `limit` defaults to 50 and is capped at 500; zero is rejected.
    pub fn new(product_id: Option<ProductId>, limit: Option<usize>) -> DomainResult<Self> {
        let limit = match limit {
            None => Self::DEFAULT_LIMIT,
            Some(0) => return Err(DomainError::validation("limit must be greater than zero")),
            Some(n) => n.min(Self::MAX_LIMIT),
        };
        Ok(Self { product_id, limit })
    }

    pub fn matches(&self, movement: &StockMovement) -> bool {
        self.product_id.is_none_or(|p| p == movement.product_id)
    }
}

impl Default for MovementFilter {
    fn default() -> Self {
        Self {
            product_id: None,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}
