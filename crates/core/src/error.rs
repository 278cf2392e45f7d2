//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// missing references, conflicts, stock sufficiency). Infrastructure concerns
/// belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Current state prevents the operation (duplicate SKU, movement history, ...).
    #[error("conflict: {0}")]
    Conflict(String),

    /// An exit asked for more than the lot currently holds.
    #[error(
        "insufficient stock in lot {lot_number}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        lot_number: String,
        available: i64,
        requested: i64,
    },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn insufficient_stock(
        lot_number: impl Into<String>,
        available: i64,
        requested: i64,
    ) -> Self {
        Self::InsufficientStock {
            lot_number: lot_number.into(),
            available,
            requested,
        }
    }

    /// Stable machine-readable code, used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::InvalidId(_) => "invalid_id",
            DomainError::NotFound(_) => "not_found",
            DomainError::Conflict(_) => "conflict",
            DomainError::InsufficientStock { .. } => "insufficient_stock",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_message_names_lot_and_available_quantity() {
        let err = DomainError::insufficient_stock("LOT-42", 3, 5);
        let msg = err.to_string();
        assert!(msg.contains("LOT-42"));
        assert!(msg.contains("available 3"));
        assert_eq!(err.code(), "insufficient_stock");
    }

    #[test]
    fn not_found_names_the_entity() {
        assert_eq!(DomainError::not_found("product").to_string(), "product not found");
    }
}
