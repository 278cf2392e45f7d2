//! Postgres-backed inventory store.
//!
//! ## Transactions
//!
//! Every mutating method runs in one SQLx transaction with a local
//! `statement_timeout`. Expected failures (unknown ids, insufficient stock,
//! movement history) roll back explicitly before the error is returned. If the
//! calling future is dropped mid-transaction (client disconnect), the
//! `Transaction` is dropped and SQLx rolls it back.
//!
//! ## Exit serialization
//!
//! `record_exit` loads the lot with `SELECT … FOR UPDATE`, so concurrent exits
//! on the same lot queue on the row lock and each sees the committed quantity
//! of the previous one. The decrement is also conditional
//! (`WHERE current_quantity >= $qty`), so an overdraft can never be written
//! even if the lock were bypassed. Exits on different lots do not contend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{instrument, warn};
use uuid::Uuid;

use medistock_core::{DomainError, Entity, ProductId, StockLotId};
use medistock_inventory::{
    EntryReceipt, ExitReceipt, MovementFilter, MovementType, RegisterExit, StockLot, StockMovement,
};
use medistock_products::Product;

use super::InventoryStore;
use crate::config::PostgresConfig;
use crate::error::{StoreError, StoreResult, map_sqlx_error};

const SCHEMA: &str = include_str!("../../migrations/0001_inventory.sql");

const LOT_COLUMNS: &str =
    "id, product_id, lot_number, expiry_date, initial_quantity, current_quantity, entry_date";
const PRODUCT_COLUMNS: &str =
    "id, name, sku, category, unit_measure, min_stock_level, location, created_at";
const MOVEMENT_COLUMNS: &str =
    "id, movement_type, quantity, reason, product_id, stock_lot_id, user_id, created_at";

#[derive(Debug, Clone)]
pub struct PostgresInventoryStore {
    pool: Arc<PgPool>,
    statement_timeout: Duration,
}

impl PostgresInventoryStore {
    /// Create a store over an existing pool.
    pub fn new(pool: PgPool, statement_timeout: Duration) -> Self {
        Self {
            pool: Arc::new(pool),
            statement_timeout,
        }
    }

    /// Open a pool from configuration.
    pub async fn connect(config: &PostgresConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        Ok(Self::new(pool, config.statement_timeout))
    }

    /// Apply the schema (idempotent).
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    async fn begin(&self, operation: &str) -> StoreResult<Transaction<'static, Postgres>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        sqlx::query("SELECT set_config('statement_timeout', $1, true)")
            .bind(self.statement_timeout.as_millis().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        Ok(tx)
    }
}

/// Roll back and surface the original error (a failed rollback is only logged).
async fn abort<T>(
    tx: Transaction<'static, Postgres>,
    operation: &str,
    err: StoreError,
) -> StoreResult<T> {
    if let Err(rollback_err) = tx.rollback().await {
        warn!(operation, error = %rollback_err, "rollback failed");
    }
    Err(err)
}

fn missing<E: Entity>() -> StoreError {
    DomainError::not_found(E::kind()).into()
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    #[instrument(skip(self, product), fields(sku = %product.sku), err)]
    async fn insert_product(&self, product: Product) -> StoreResult<Product> {
        sqlx::query(&format!(
            "INSERT INTO products ({PRODUCT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.category)
        .bind(&product.unit_measure)
        .bind(product.min_stock_level)
        .bind(&product.location)
        .bind(product.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;

        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;

        row.as_ref()
            .map(product_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("get_product", e))
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, sku");
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;

        rows.iter()
            .map(product_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("list_products", e))
    }

    #[instrument(skip_all, fields(product_id = %id), err)]
    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        const OP: &str = "delete_product";
        let mut tx = self.begin(OP).await?;

        // Row lock blocks concurrent entries (their FK check needs a key-share lock).
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(OP, e))?;

        let product = match row.as_ref().map(product_from_row).transpose() {
            Ok(Some(p)) => p,
            Ok(None) => return abort(tx, OP, missing::<Product>()).await,
            Err(e) => return abort(tx, OP, map_sqlx_error(OP, e)).await,
        };

        let movement_count: i64 =
            sqlx::query("SELECT COUNT(*) FROM stock_movements WHERE product_id = $1")
                .bind(id.as_uuid())
                .fetch_one(&mut *tx)
                .await
                .and_then(|r| r.try_get(0))
                .map_err(|e| map_sqlx_error(OP, e))?;

        if let Err(e) = product.ensure_deletable(movement_count.max(0) as u64) {
            return abort(tx, OP, e.into()).await;
        }

        sqlx::query("DELETE FROM stock_lots WHERE product_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(OP, e))?;

        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(OP, e))?;

        tx.commit().await.map_err(|e| map_sqlx_error(OP, e))?;
        Ok(())
    }

    #[instrument(
        skip(self, receipt),
        fields(product_id = %receipt.new_lot.product_id, lot_id = %receipt.new_lot.id),
        err
    )]
    async fn record_entry(&self, receipt: EntryReceipt) -> StoreResult<EntryReceipt> {
        const OP: &str = "record_entry";
        let mut tx = self.begin(OP).await?;
        let lot = &receipt.new_lot;

        // An unknown product surfaces here as a foreign-key violation (→ NotFound).
        let inserted = sqlx::query(&format!(
            "INSERT INTO stock_lots ({LOT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        ))
        .bind(lot.id.as_uuid())
        .bind(lot.product_id.as_uuid())
        .bind(&lot.lot_number)
        .bind(lot.expiry_date)
        .bind(lot.initial_quantity)
        .bind(lot.current_quantity)
        .bind(lot.entry_date)
        .execute(&mut *tx)
        .await;
        if let Err(e) = inserted {
            return abort(tx, OP, map_sqlx_error(OP, e)).await;
        }

        if let Err(e) = insert_movement(&mut tx, &receipt.movement).await {
            return abort(tx, OP, map_sqlx_error(OP, e)).await;
        }

        tx.commit().await.map_err(|e| map_sqlx_error(OP, e))?;
        Ok(receipt)
    }

    #[instrument(skip(self, cmd), fields(lot_id = %cmd.stock_lot_id, quantity = cmd.quantity), err)]
    async fn record_exit(&self, cmd: RegisterExit) -> StoreResult<ExitReceipt> {
        const OP: &str = "record_exit";
        let mut tx = self.begin(OP).await?;

        let sql = format!("SELECT {LOT_COLUMNS} FROM stock_lots WHERE id = $1 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(cmd.stock_lot_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(OP, e))?;

        let mut lot = match row.as_ref().map(lot_from_row).transpose() {
            Ok(Some(lot)) => lot,
            Ok(None) => return abort(tx, OP, missing::<StockLot>()).await,
            Err(e) => return abort(tx, OP, map_sqlx_error(OP, e)).await,
        };

        let movement = match lot.apply_exit(&cmd) {
            Ok(m) => m,
            Err(e) => return abort(tx, OP, e.into()).await,
        };

        let updated = sqlx::query(
            r#"
            UPDATE stock_lots
            SET current_quantity = current_quantity - $2
            WHERE id = $1 AND current_quantity >= $2
            RETURNING current_quantity
            "#,
        )
        .bind(cmd.stock_lot_id.as_uuid())
        .bind(cmd.quantity)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error(OP, e))?;

        match updated.map(|r| r.try_get::<i64, _>("current_quantity")) {
            Some(Ok(remaining)) if remaining == lot.current_quantity => {}
            Some(Ok(remaining)) => {
                let err = StoreError::database(
                    OP,
                    format!(
                        "lot quantity drifted: expected {}, found {remaining}",
                        lot.current_quantity
                    ),
                );
                return abort(tx, OP, err).await;
            }
            Some(Err(e)) => return abort(tx, OP, map_sqlx_error(OP, e)).await,
            None => {
                let err = DomainError::insufficient_stock(
                    lot.lot_number.clone(),
                    lot.current_quantity + cmd.quantity,
                    cmd.quantity,
                );
                return abort(tx, OP, err.into()).await;
            }
        }

        if let Err(e) = insert_movement(&mut tx, &movement).await {
            return abort(tx, OP, map_sqlx_error(OP, e)).await;
        }

        tx.commit().await.map_err(|e| map_sqlx_error(OP, e))?;
        Ok(ExitReceipt {
            updated_lot: lot,
            movement,
        })
    }

    async fn get_lot(&self, id: StockLotId) -> StoreResult<Option<StockLot>> {
        let row = sqlx::query(&format!("SELECT {LOT_COLUMNS} FROM stock_lots WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_lot", e))?;

        row.as_ref()
            .map(lot_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("get_lot", e))
    }

    async fn active_lots(&self, product_id: Option<ProductId>) -> StoreResult<Vec<StockLot>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {LOT_COLUMNS}
            FROM stock_lots
            WHERE current_quantity > 0 AND ($1::uuid IS NULL OR product_id = $1)
            ORDER BY expiry_date ASC NULLS LAST, entry_date ASC, id ASC
            "#
        ))
        .bind(product_id.map(Uuid::from))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("active_lots", e))?;

        rows.iter()
            .map(lot_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("active_lots", e))
    }

    async fn list_movements(&self, filter: MovementFilter) -> StoreResult<Vec<StockMovement>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {MOVEMENT_COLUMNS}
            FROM stock_movements
            WHERE ($1::uuid IS NULL OR product_id = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#
        ))
        .bind(filter.product_id.map(Uuid::from))
        .bind(filter.limit as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_movements", e))?;

        rows.iter()
            .map(movement_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("list_movements", e))
    }
}

async fn insert_movement(
    tx: &mut Transaction<'static, Postgres>,
    movement: &StockMovement,
) -> Result<(), sqlx::Error> {
    sqlx::query(&format!(
        "INSERT INTO stock_movements ({MOVEMENT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
    ))
    .bind(movement.id.as_uuid())
    .bind(movement.movement_type.as_str())
    .bind(movement.quantity)
    .bind(&movement.reason)
    .bind(movement.product_id.as_uuid())
    .bind(movement.stock_lot_id.as_uuid())
    .bind(movement.user_id.as_uuid())
    .bind(movement.created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

// SQLx row mapping

fn product_from_row(row: &PgRow) -> Result<Product, sqlx::Error> {
    Ok(Product {
        id: ProductId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        sku: row.try_get("sku")?,
        category: row.try_get("category")?,
        unit_measure: row.try_get("unit_measure")?,
        min_stock_level: row.try_get("min_stock_level")?,
        location: row.try_get("location")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn lot_from_row(row: &PgRow) -> Result<StockLot, sqlx::Error> {
    Ok(StockLot {
        id: StockLotId::from_uuid(row.try_get("id")?),
        product_id: ProductId::from_uuid(row.try_get("product_id")?),
        lot_number: row.try_get("lot_number")?,
        expiry_date: row.try_get::<Option<NaiveDate>, _>("expiry_date")?,
        initial_quantity: row.try_get("initial_quantity")?,
        current_quantity: row.try_get("current_quantity")?,
        entry_date: row.try_get::<DateTime<Utc>, _>("entry_date")?,
    })
}

fn movement_from_row(row: &PgRow) -> Result<StockMovement, sqlx::Error> {
    let movement_type: String = row.try_get("movement_type")?;
    let movement_type: MovementType = movement_type.parse().map_err(|e: DomainError| {
        sqlx::Error::ColumnDecode {
            index: "movement_type".to_string(),
            source: Box::new(e),
        }
    })?;

    Ok(StockMovement {
        id: medistock_core::MovementId::from_uuid(row.try_get("id")?),
        movement_type,
        quantity: row.try_get("quantity")?,
        reason: row.try_get("reason")?,
        product_id: ProductId::from_uuid(row.try_get("product_id")?),
        stock_lot_id: StockLotId::from_uuid(row.try_get("stock_lot_id")?),
        user_id: medistock_core::UserId::from_uuid(row.try_get("user_id")?),
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}
