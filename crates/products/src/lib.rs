//! Products domain module (catalog).
//!
//! This crate contains catalog rules (product validation, the deletion guard)
//! and per-product stock views, implemented purely as deterministic domain
//! logic (no IO, no HTTP, no storage).

pub mod product;
pub mod stock;

pub use product::{CreateProduct, DEFAULT_UNIT_MEASURE, Product};
pub use stock::{ProductDetails, ProductStockSummary, summarize};
