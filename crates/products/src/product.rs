use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use medistock_core::{DomainError, DomainResult, Entity, ProductId};

pub const DEFAULT_UNIT_MEASURE: &str = "unit";

/// Catalog product. Owns zero or more stock lots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub category: Option<String>,
    pub unit_measure: String,
    pub min_stock_level: i64,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn kind() -> &'static str {
        "product"
    }
}

impl Product {
    /// Deletion guard: a product with any recorded movement can never be removed.
    ///
    /// The caller must count movements inside the same transaction that
    /// performs the delete.
    pub fn ensure_deletable(&self, movement_count: u64) -> DomainResult<()> {
        if movement_count > 0 {
            return Err(DomainError::conflict(format!(
                "product {} has movement history, cannot be deleted",
                self.sku
            )));
        }
        Ok(())
    }
}

/// Command: CreateProduct.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub sku: String,
    pub category: Option<String>,
    pub unit_measure: Option<String>,
    pub min_stock_level: Option<i64>,
    pub location: Option<String>,
}

impl CreateProduct {
    pub fn into_product(self, id: ProductId, created_at: DateTime<Utc>) -> DomainResult<Product> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        let sku = self.sku.trim();
        if sku.is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        let min_stock_level = self.min_stock_level.unwrap_or(0);
        if min_stock_level < 0 {
            return Err(DomainError::validation("minStockLevel cannot be negative"));
        }

        Ok(Product {
            id,
            name: name.to_string(),
            sku: sku.to_string(),
            category: non_blank(self.category),
            unit_measure: non_blank(self.unit_measure)
                .unwrap_or_else(|| DEFAULT_UNIT_MEASURE.to_string()),
            min_stock_level,
            location: non_blank(self.location),
            created_at,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(name: &str, sku: &str) -> CreateProduct {
        CreateProduct {
            name: name.to_string(),
            sku: sku.to_string(),
            ..CreateProduct::default()
        }
    }

    #[test]
    fn create_product_applies_defaults_and_trims() {
        let mut cmd = create("  Amoxicillin 500mg ", " AMX-500 ");
        cmd.category = Some("   ".to_string());
        cmd.location = Some(" Shelf B2 ".to_string());

        let product = cmd.into_product(ProductId::new(), Utc::now()).unwrap();
        assert_eq!(product.name, "Amoxicillin 500mg");
        assert_eq!(product.sku, "AMX-500");
        assert_eq!(product.category, None);
        assert_eq!(product.unit_measure, DEFAULT_UNIT_MEASURE);
        assert_eq!(product.min_stock_level, 0);
        assert_eq!(product.location.as_deref(), Some("Shelf B2"));
    }

    #[test]
    fn create_product_rejects_empty_name_or_sku() {
        for cmd in [create(" ", "SKU"), create("Gauze", "")] {
            match cmd.into_product(ProductId::new(), Utc::now()).unwrap_err() {
                DomainError::Validation(_) => {}
                other => panic!("expected Validation, got {other:?}"),
            }
        }
    }

    #[test]
    fn create_product_rejects_negative_minimum() {
        let mut cmd = create("Gauze", "GZ-1");
        cmd.min_stock_level = Some(-1);
        assert!(matches!(
            cmd.into_product(ProductId::new(), Utc::now()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn deletion_blocked_by_any_movement() {
        let product = create("Gauze", "GZ-1")
            .into_product(ProductId::new(), Utc::now())
            .unwrap();

        assert!(product.ensure_deletable(0).is_ok());
        match product.ensure_deletable(1).unwrap_err() {
            DomainError::Conflict(msg) => assert!(msg.contains("movement history")),
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[test]
    fn product_json_is_camel_case() {
        let product = create("Gauze", "GZ-1")
            .into_product(ProductId::new(), Utc::now())
            .unwrap();
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["unitMeasure"], "unit");
        assert_eq!(json["minStockLevel"], 0);
    }
}
