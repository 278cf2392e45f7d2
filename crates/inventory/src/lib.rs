//! Inventory domain module (lot-tracked stock).
//!
//! This crate contains business rules for lots and their movement trail,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).
//! Stores call into these rules from inside their own transactions.

pub mod fefo;
pub mod lot;
pub mod movement;

pub use fefo::{available_lots, fefo_cmp, total_available};
pub use lot::{EntryReceipt, ExitReceipt, LotState, RegisterEntry, RegisterExit, StockLot};
pub use movement::{
    DEFAULT_ENTRY_REASON, DEFAULT_EXIT_REASON, MovementFilter, MovementType, StockMovement,
};
