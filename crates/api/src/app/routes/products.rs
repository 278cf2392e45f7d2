use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use medistock_core::{DomainError, ProductId};
use medistock_products::CreateProduct;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/:id", get(get_product).delete(delete_product))
        .route("/:id/details", get(product_details))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::CreateProductRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, authz::PRODUCTS_CREATE) {
        return errors::forbidden(e);
    }
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => return errors::invalid_body(rejection),
    };

    match services.catalog.create_product(CreateProduct::from(body)).await {
        Ok(product) => (StatusCode::CREATED, Json(product)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, authz::PRODUCTS_READ) {
        return errors::forbidden(e);
    }
    match services.catalog.list_products().await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, authz::PRODUCTS_READ) {
        return errors::forbidden(e);
    }
    let id: ProductId = match errors::parse_id(&id, "product") {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.catalog.get_product(id).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn product_details(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, authz::STOCK_READ) {
        return errors::forbidden(e);
    }
    let id: ProductId = match errors::parse_id(&id, "product") {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.queries.product_details(id).await {
        Ok(details) => (StatusCode::OK, Json(details)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = authz::require(&principal, authz::PRODUCTS_DELETE) {
        return errors::forbidden(e);
    }
    let id: ProductId = match errors::parse_id(&id, "product") {
        Ok(id) => id,
        Err(res) => return res,
    };

    match services.catalog.delete_product(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        // Movement history makes the request itself invalid.
        Err(e) => match e.as_domain() {
            Some(err @ DomainError::Conflict(_)) => {
                errors::json_error(StatusCode::BAD_REQUEST, err.code(), err.to_string())
            }
            _ => errors::store_error_to_response(e),
        },
    }
}
