//! Integration tests for the Postgres inventory store.
//!
//! These tests require a running PostgreSQL database. Set `TEST_DATABASE_URL`
//! to run them; without it every test returns early.
//!
//! Each test works on its own products (unique SKUs), so the suite can share
//! one database and run in parallel.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::sync::OnceCell;

use medistock_core::{DomainError, ProductId, UserId};
use medistock_infra::{
    InventoryStore, LotLedger, PostgresConfig, PostgresInventoryStore, ProductCatalog,
    StockQueryService, StoreError,
};
use medistock_inventory::{MovementFilter, MovementType, RegisterEntry, RegisterExit, StockLot};
use medistock_products::CreateProduct;

static SCHEMA: OnceCell<()> = OnceCell::const_new();

type Store = Arc<PostgresInventoryStore>;

struct Harness {
    store: Store,
    ledger: LotLedger<Store>,
    catalog: ProductCatalog<Store>,
    queries: StockQueryService<Store>,
    actor: UserId,
}

async fn harness() -> Option<Harness> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping postgres store test");
        return None;
    };

    let mut config = PostgresConfig::new(url);
    config.max_connections = 16;
    let store = Arc::new(PostgresInventoryStore::connect(&config).await.unwrap());

    // Concurrent CREATE TABLE IF NOT EXISTS can still collide, so apply once.
    SCHEMA
        .get_or_init(|| async { store.migrate().await.unwrap() })
        .await;

    Some(Harness {
        ledger: LotLedger::new(store.clone()),
        catalog: ProductCatalog::new(store.clone()),
        queries: StockQueryService::new(store.clone()),
        store,
        actor: UserId::new(),
    })
}

impl Harness {
    async fn product(&self, label: &str) -> ProductId {
        self.catalog
            .create_product(CreateProduct {
                name: format!("Product {label}"),
                sku: unique_sku(label),
                ..CreateProduct::default()
            })
            .await
            .unwrap()
            .id
    }

    async fn receive(
        &self,
        product_id: ProductId,
        lot: &str,
        qty: i64,
        expiry: Option<NaiveDate>,
    ) -> StockLot {
        self.ledger
            .register_entry(self.entry_cmd(product_id, lot, qty, expiry))
            .await
            .unwrap()
            .new_lot
    }

    fn entry_cmd(
        &self,
        product_id: ProductId,
        lot: &str,
        qty: i64,
        expiry: Option<NaiveDate>,
    ) -> RegisterEntry {
        RegisterEntry {
            product_id,
            lot_number: lot.to_string(),
            expiry_date: expiry,
            quantity: qty,
            reason: None,
            actor: self.actor,
            occurred_at: Utc::now(),
        }
    }

    fn exit_cmd(&self, lot: &StockLot, qty: i64) -> RegisterExit {
        RegisterExit {
            stock_lot_id: lot.id,
            quantity: qty,
            reason: None,
            actor: self.actor,
            occurred_at: Utc::now(),
        }
    }

    async fn movements_for(&self, product_id: ProductId) -> usize {
        let filter = MovementFilter::new(Some(product_id), None).unwrap();
        self.store.list_movements(filter).await.unwrap().len()
    }
}

fn unique_sku(label: &str) -> String {
    format!("{label}-{}", UserId::new())
}

fn is_insufficient(err: &StoreError) -> bool {
    matches!(err.as_domain(), Some(DomainError::InsufficientStock { .. }))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_exits_on_one_lot_allow_exactly_one_success() {
    let Some(h) = harness().await else { return };
    let h = Arc::new(h);
    let p = h.product("race").await;
    let lot = h.receive(p, "L1", 5, None).await;

    let mut handles = Vec::new();
    for _ in 0..12 {
        let h = h.clone();
        let cmd = h.exit_cmd(&lot, 3);
        handles.push(tokio::spawn(async move { h.ledger.register_exit(cmd).await }));
    }

    let (mut ok, mut insufficient) = (0, 0);
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(e) if is_insufficient(&e) => insufficient += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!((ok, insufficient), (1, 11));
    let remaining = h.store.get_lot(lot.id).await.unwrap().unwrap();
    assert_eq!(remaining.current_quantity, 2);

    // One ENTRY plus exactly one EXIT: failed exits left no movement behind.
    let filter = MovementFilter::new(Some(p), None).unwrap();
    let history = h.store.list_movements(filter).await.unwrap();
    let exits = history
        .iter()
        .filter(|m| m.movement_type == MovementType::Exit)
        .count();
    assert_eq!((history.len(), exits), (2, 1));
}

#[tokio::test]
async fn overdraft_rolls_back_and_reports_available_quantity() {
    let Some(h) = harness().await else { return };
    let p = h.product("overdraft").await;
    let lot = h.receive(p, "L9", 4, None).await;

    for _ in 0..2 {
        let err = h.ledger.register_exit(h.exit_cmd(&lot, 5)).await.unwrap_err();
        match err.as_domain() {
            Some(DomainError::InsufficientStock {
                lot_number,
                available,
                requested,
            }) => {
                assert_eq!(lot_number, "L9");
                assert_eq!((*available, *requested), (4, 5));
            }
            other => panic!("expected insufficient stock, got {other:?}"),
        }
    }

    let unchanged = h.store.get_lot(lot.id).await.unwrap().unwrap();
    assert_eq!(unchanged.current_quantity, 4);
    assert_eq!(h.movements_for(p).await, 1);
}

#[tokio::test]
async fn entry_for_unknown_product_is_not_found_and_writes_nothing() {
    let Some(h) = harness().await else { return };
    let ghost = ProductId::new();

    let err = h
        .ledger
        .register_entry(h.entry_cmd(ghost, "L1", 3, None))
        .await
        .unwrap_err();
    assert_eq!(err.as_domain(), Some(&DomainError::not_found("product")));

    assert!(h.queries.available_lots(ghost).await.unwrap().is_empty());
    assert_eq!(h.movements_for(ghost).await, 0);
}

#[tokio::test]
async fn duplicate_sku_is_a_conflict() {
    let Some(h) = harness().await else { return };
    let sku = unique_sku("dup");

    let create = |name: &str| CreateProduct {
        name: name.to_string(),
        sku: sku.clone(),
        ..CreateProduct::default()
    };
    h.catalog.create_product(create("First")).await.unwrap();

    let err = h.catalog.create_product(create("Second")).await.unwrap_err();
    assert!(matches!(err.as_domain(), Some(DomainError::Conflict(_))));
}

#[tokio::test]
async fn deletion_guard_honours_movement_history() {
    let Some(h) = harness().await else { return };

    let used = h.product("used").await;
    let lot = h.receive(used, "L1", 2, None).await;
    h.ledger.register_exit(h.exit_cmd(&lot, 2)).await.unwrap();

    let err = h.catalog.delete_product(used).await.unwrap_err();
    assert!(matches!(err.as_domain(), Some(DomainError::Conflict(_))));
    assert!(h.catalog.get_product(used).await.is_ok());
    assert!(h.store.get_lot(lot.id).await.unwrap().is_some());

    let unused = h.product("unused").await;
    h.catalog.delete_product(unused).await.unwrap();
    let err = h.catalog.get_product(unused).await.unwrap_err();
    assert!(matches!(err.as_domain(), Some(DomainError::NotFound(_))));

    let err = h.catalog.delete_product(unused).await.unwrap_err();
    assert!(matches!(err.as_domain(), Some(DomainError::NotFound(_))));
}

#[tokio::test]
async fn available_lots_follow_fefo_with_undated_lots_last() {
    let Some(h) = harness().await else { return };
    let p = h.product("fefo").await;

    let undated = h.receive(p, "U", 1, None).await;
    let l2 = h.receive(p, "L2", 5, NaiveDate::from_ymd_opt(2025, 2, 1)).await;
    let l1 = h.receive(p, "L1", 10, NaiveDate::from_ymd_opt(2025, 1, 1)).await;

    let lots = h.queries.available_lots(p).await.unwrap();
    let order: Vec<&str> = lots.iter().map(|l| l.lot_number.as_str()).collect();
    assert_eq!(order, vec!["L1", "L2", "U"]);

    h.ledger.register_exit(h.exit_cmd(&l1, 10)).await.unwrap();
    let lots = h.queries.available_lots(p).await.unwrap();
    let ids: Vec<_> = lots.iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![l2.id, undated.id]);

    let details = h.queries.product_details(p).await.unwrap();
    assert_eq!(details.total_quantity, 6);
}
