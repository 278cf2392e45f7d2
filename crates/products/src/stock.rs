//! Read-side stock views per product (summaries and details).

use serde::{Deserialize, Serialize};

use medistock_core::ProductId;
use medistock_inventory::{StockLot, available_lots, total_available};

use crate::product::Product;

/// One row of the stock summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStockSummary {
    pub product_id: ProductId,
    pub name: String,
    pub sku: String,
    pub unit_measure: String,
    pub min_stock_level: i64,
    pub total_quantity: i64,
    pub below_minimum: bool,
}

impl ProductStockSummary {
    pub fn new(product: &Product, lots: &[StockLot]) -> Self {
        let total_quantity = total_available(lots.iter().filter(|l| l.product_id == product.id));
        Self {
            product_id: product.id,
            name: product.name.clone(),
            sku: product.sku.clone(),
            unit_measure: product.unit_measure.clone(),
            min_stock_level: product.min_stock_level,
            total_quantity,
            below_minimum: total_quantity < product.min_stock_level,
        }
    }
}

/// Product attributes plus its active stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    #[serde(flatten)]
    pub product: Product,
    pub total_quantity: i64,
    pub lots_breakdown: Vec<StockLot>,
}

impl ProductDetails {
    pub fn new(product: Product, lots: impl IntoIterator<Item = StockLot>) -> Self {
        let lots_breakdown =
            available_lots(lots.into_iter().filter(|l| l.product_id == product.id));
        let total_quantity = total_available(&lots_breakdown);
        Self {
            product,
            total_quantity,
            lots_breakdown,
        }
    }
}

/// Build summaries for every product, sorted by name (case-insensitive) then sku.
pub fn summarize(products: &[Product], lots: &[StockLot]) -> Vec<ProductStockSummary> {
    let mut rows: Vec<ProductStockSummary> = products
        .iter()
        .map(|p| ProductStockSummary::new(p, lots))
        .collect();
    rows.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.sku.cmp(&b.sku))
    });
    rows
}
