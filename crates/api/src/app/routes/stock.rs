use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use medistock_core::{DomainError, ProductId};
use medistock_inventory::{MovementFilter, RegisterEntry, RegisterExit};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/entry", post(entry))
        .route("/exit", post(exit))
        .route("/summary", get(summary))
        .route("/low-stock", get(low_stock))
        .route("/lots/:product_id", get(available_lots))
        .route("/movements", get(movements))
}

pub async fn entry(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::StockEntryRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, authz::STOCK_ENTRY) {
        return errors::forbidden(e);
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::invalid_body(rejection),
    };

    let cmd = RegisterEntry {
        product_id: body.product_id,
        lot_number: body.lot_number,
        expiry_date: body.expiry_date,
        quantity: body.quantity,
        reason: body.reason,
        actor: principal.user_id(),
        occurred_at: Utc::now(),
    };

    match services.ledger.register_entry(cmd).await {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn exit(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::StockExitRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, authz::STOCK_EXIT) {
        return errors::forbidden(e);
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::invalid_body(rejection),
    };

    let cmd = RegisterExit {
        stock_lot_id: body.stock_lot_id,
        quantity: body.quantity,
        reason: body.reason,
        actor: principal.user_id(),
        occurred_at: Utc::now(),
    };

    match services.ledger.register_exit(cmd).await {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        // An unknown lot is a bad request on this route, not a missing resource.
        Err(e) => match e.as_domain() {
            Some(err @ DomainError::NotFound(_)) => {
                errors::json_error(StatusCode::BAD_REQUEST, err.code(), err.to_string())
            }
            _ => errors::store_error_to_response(e),
        },
    }
}

pub async fn summary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, authz::STOCK_READ) {
        return errors::forbidden(e);
    }
    match services.queries.product_stock_summary().await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn low_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, authz::STOCK_READ) {
        return errors::forbidden(e);
    }
    match services.queries.low_stock().await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn available_lots(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(product_id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, authz::STOCK_READ) {
        return errors::forbidden(e);
    }
    let product_id: ProductId = match errors::parse_id(&product_id, "product") {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.queries.available_lots(product_id).await {
        Ok(lots) => (StatusCode::OK, Json(lots)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn movements(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    query: Result<Query<dto::MovementsQuery>, QueryRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, authz::STOCK_READ) {
        return errors::forbidden(e);
    }
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => return errors::invalid_query(rejection),
    };
    let filter = match MovementFilter::new(query.product_id, query.limit) {
        Ok(f) => f,
        Err(e) => return errors::domain_error_to_response(&e),
    };

    match services.queries.movements(filter).await {
        Ok(history) => (StatusCode::OK, Json(history)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
