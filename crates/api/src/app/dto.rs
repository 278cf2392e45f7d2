use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};

use medistock_core::{ProductId, StockLotId};
use medistock_products::CreateProduct;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StockEntryRequest {
    pub product_id: ProductId,
    pub lot_number: String,
    #[serde(default, deserialize_with = "optional_date")]
    pub expiry_date: Option<NaiveDate>,
    pub quantity: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StockExitRequest {
    pub stock_lot_id: StockLotId,
    pub quantity: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateProductRequest {
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub unit_measure: Option<String>,
    #[serde(default)]
    pub min_stock_level: Option<i64>,
    #[serde(default)]
    pub location: Option<String>,
}

impl From<CreateProductRequest> for CreateProduct {
    fn from(req: CreateProductRequest) -> Self {
        CreateProduct {
            name: req.name,
            sku: req.sku,
            category: req.category,
            unit_measure: req.unit_measure,
            min_stock_level: req.min_stock_level,
            location: req.location,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MovementsQuery {
    pub product_id: Option<ProductId>,
    pub limit: Option<usize>,
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (its date part is kept).
fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    if let Ok(date) = NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| Some(dt.date_naive()))
        .map_err(|_| serde::de::Error::custom(format!("invalid expiryDate '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entry_accepts_date_or_timestamp_expiry() {
        let id = ProductId::new();
        for expiry in ["2025-01-01", "2025-01-01T10:00:00Z"] {
            let req: StockEntryRequest = serde_json::from_value(json!({
                "productId": id,
                "lotNumber": "L1",
                "expiryDate": expiry,
                "quantity": 10,
            }))
            .unwrap();
            assert_eq!(req.expiry_date, NaiveDate::from_ymd_opt(2025, 1, 1));
            assert_eq!(req.reason, None);
        }
    }

    #[test]
    fn entry_expiry_is_optional() {
        let req: StockEntryRequest = serde_json::from_value(json!({
            "productId": ProductId::new(),
            "lotNumber": "L1",
            "expiryDate": null,
            "quantity": 1,
        }))
        .unwrap();
        assert_eq!(req.expiry_date, None);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let res = serde_json::from_value::<StockExitRequest>(json!({
            "stockLotId": StockLotId::new(),
            "quantity": 1,
            "productId": ProductId::new(),
        }));
        assert!(res.is_err());
    }

    #[test]
    fn malformed_expiry_is_rejected() {
        let res = serde_json::from_value::<StockEntryRequest>(json!({
            "productId": ProductId::new(),
            "lotNumber": "L1",
            "expiryDate": "next tuesday",
            "quantity": 1,
        }));
        assert!(res.is_err());
    }
}
