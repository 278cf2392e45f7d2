//! First-Expired-First-Out selection over lots.
//!
//! Lots without an expiry date are treated as never-expiring and sort after
//! every dated lot. Ties fall back to entry date, then lot id, so the order
//! is total.

use core::cmp::Ordering;

use crate::lot::StockLot;

/// FEFO ordering between two lots.
pub fn fefo_cmp(a: &StockLot, b: &StockLot) -> Ordering {
    let by_expiry = match (a.expiry_date, b.expiry_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    by_expiry
        .then_with(|| a.entry_date.cmp(&b.entry_date))
        .then_with(|| a.id.cmp(&b.id))
}

/// Active lots (`current_quantity > 0`) in FEFO order.
pub fn available_lots(lots: impl IntoIterator<Item = StockLot>) -> Vec<StockLot> {
    let mut active: Vec<StockLot> = lots.into_iter().filter(StockLot::is_active).collect();
    active.sort_by(fefo_cmp);
    active
}

/// Sum of `current_quantity` over active lots.
pub fn total_available<'a>(lots: impl IntoIterator<Item = &'a StockLot>) -> i64 {
    lots.into_iter()
        .filter(|l| l.is_active())
        .map(|l| l.current_quantity)
        .sum()
}
