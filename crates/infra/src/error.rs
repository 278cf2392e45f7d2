//! Store error model and SQLx error mapping.
//!
//! SQLx errors are mapped by SQLSTATE so callers can tell expected domain
//! failures apart from infrastructure failures:
//!
//! | PostgreSQL Error Code | StoreError | Scenario |
//! |----------------------|------------|----------|
//! | `23505` (unique violation) | `Domain(Conflict)` | Duplicate SKU |
//! | `23503` (foreign key violation) | `Domain(NotFound)` | Entry for an unknown product |
//! | `23514` (check violation) | `Domain(Validation)` | Negative quantity / minimum level |
//! | Any other / pool / IO errors | `Database` | Unexpected infrastructure failure |

use thiserror::Error;

use medistock_core::DomainError;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Expected business failure, detected inside the transaction.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Unexpected persistence failure. Never shown to API callers verbatim.
    #[error("database error in {operation}: {message}")]
    Database { operation: String, message: String },
}

impl StoreError {
    pub fn database(operation: &str, message: impl Into<String>) -> Self {
        Self::Database {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            StoreError::Domain(e) => Some(e),
            StoreError::Database { .. } => None,
        }
    }
}

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("{}: {}", operation, db_err.message());

            match db_err.code().as_deref() {
                Some("23505") => {
                    if db_err.constraint() == Some("products_sku_key") {
                        DomainError::conflict("a product with this sku already exists").into()
                    } else {
                        DomainError::conflict(msg).into()
                    }
                }
                Some("23503") => {
                    if db_err.constraint() == Some("stock_lots_product_id_fkey") {
                        DomainError::not_found("product").into()
                    } else {
                        DomainError::not_found(format!("referenced record ({msg})")).into()
                    }
                }
                Some("23514") => DomainError::validation(msg).into(),
                _ => StoreError::database(operation, db_err.message()),
            }
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::database(operation, "timed out acquiring a connection")
        }
        sqlx::Error::PoolClosed => StoreError::database(operation, "connection pool closed"),
        other => StoreError::database(operation, other.to_string()),
    }
}
