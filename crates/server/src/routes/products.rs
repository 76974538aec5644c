use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, State},
    http::StatusCode,
    Extension, Json,
};
use common::types::MessageBody;
use serde::Deserialize;
use service::product::domain::{CreateProductInput, Product, UpdateProductInput};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{errors::JsonApiError, routes::auth::{CallerIdentity, ServerState}};

/// Body of create and full-replace update. Absent fields decode to empty values
/// and are rejected by the service rules.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct ProductRequest {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i32,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct ReduceStockRequest {
    pub quantity: i32,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, JsonApiError> {
    match payload {
        Ok(Json(v)) => Ok(v),
        Err(e) => {
            warn!(err = %e.body_text(), "invalid request body");
            Err(JsonApiError::invalid_body())
        }
    }
}

fn path_id(id: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, JsonApiError> {
    match id {
        Ok(Path(id)) => Ok(id),
        Err(e) => {
            warn!(err = %e.body_text(), "invalid product id");
            Err(JsonApiError::invalid_id())
        }
    }
}

#[utoipa::path(
    post, path = "/create", tag = "products",
    request_body = ProductRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Created", body = crate::openapi::MessageBodyDoc),
        (status = 400, description = "Validation Error", body = crate::openapi::ErrorBodyDoc),
        (status = 401, description = "Unauthorized", body = crate::openapi::ErrorBodyDoc),
        (status = 500, description = "Create Failed", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    Extension(caller): Extension<CallerIdentity>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageBody>), JsonApiError> {
    let req = body(payload)?;
    debug!(user_id = %caller.user_id, name = %req.name, "product_create_request");

    let product = state
        .products
        .create(CreateProductInput {
            name: req.name,
            description: req.description,
            price: req.price,
            stock: req.stock,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageBody::new("Product created successfully").with_id(product.id)),
    ))
}

#[utoipa::path(
    get, path = "/{id}", tag = "products",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "OK", body = crate::openapi::ProductDoc),
        (status = 400, description = "Invalid ID", body = crate::openapi::ErrorBodyDoc),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn get_by_id(
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Product>, JsonApiError> {
    let id = path_id(id)?;
    let product = state.products.get_by_id(id).await?;
    Ok(Json(product))
}

#[utoipa::path(
    get, path = "/list", tag = "products",
    responses(
        (status = 200, description = "List OK", body = [crate::openapi::ProductDoc]),
        (status = 500, description = "List Failed", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<Product>>, JsonApiError> {
    let products = state.products.list().await?;
    debug!(count = products.len(), "list products");
    Ok(Json(products))
}

#[utoipa::path(
    put, path = "/reduce-stock/{id}", tag = "products",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = ReduceStockRequest,
    security(("internal_api_key" = [])),
    responses(
        (status = 200, description = "Stock reduced", body = crate::openapi::MessageBodyDoc),
        (status = 400, description = "Invalid quantity", body = crate::openapi::ErrorBodyDoc),
        (status = 403, description = "Forbidden", body = crate::openapi::ErrorBodyDoc),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn reduce_stock(
    State(state): State<ServerState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ReduceStockRequest>, JsonRejection>,
) -> Result<Json<MessageBody>, JsonApiError> {
    let id = path_id(id)?;
    let req = body(payload)?;
    state.products.reduce_stock(id, req.quantity).await?;
    Ok(Json(MessageBody::new("Stock reduced successfully")))
}

#[utoipa::path(
    put, path = "/{id}", tag = "products",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = ProductRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated", body = crate::openapi::MessageBodyDoc),
        (status = 400, description = "Validation Error", body = crate::openapi::ErrorBodyDoc),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorBodyDoc),
        (status = 500, description = "Update Failed", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    Extension(caller): Extension<CallerIdentity>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<Json<MessageBody>, JsonApiError> {
    let id = path_id(id)?;
    let req = body(payload)?;
    debug!(user_id = %caller.user_id, product_id = %id, "product_update_request");

    state
        .products
        .update(UpdateProductInput {
            id,
            name: req.name,
            description: req.description,
            price: req.price,
            stock: req.stock,
        })
        .await?;
    Ok(Json(MessageBody::new("Product updated successfully")))
}

#[utoipa::path(
    delete, path = "/{id}", tag = "products",
    params(("id" = Uuid, Path, description = "Product ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Deleted", body = crate::openapi::MessageBodyDoc),
        (status = 400, description = "Invalid ID", body = crate::openapi::ErrorBodyDoc),
        (status = 500, description = "Delete Failed", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(caller): Extension<CallerIdentity>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MessageBody>, JsonApiError> {
    let id = path_id(id)?;
    debug!(user_id = %caller.user_id, product_id = %id, "product_delete_request");
    state.products.delete(id).await?;
    Ok(Json(MessageBody::new("Product deleted successfully")))
}
