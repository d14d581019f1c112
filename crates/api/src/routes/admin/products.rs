//! Admin catalog management.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use bazaar_core::{ProductId, ProductStatus};

use super::BulkResponse;
use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::{ApiJson, ApiPath, RequireAdmin};
use crate::models::{CreateProductRequest, Product, UpdateProductRequest};
use crate::routes::MessageResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub product_ids: Vec<ProductId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkVisibilityRequest {
    #[serde(default)]
    pub product_ids: Vec<ProductId>,
    #[serde(default)]
    pub status: String,
}

fn require_ids(ids: &[ProductId]) -> Result<()> {
    if ids.is_empty() {
        return Err(AppError::Validation("Product IDs are required".to_string()));
    }
    Ok(())
}

/// Every product, active or not, newest first.
///
/// GET /api/admin/products
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list_all().await?;
    Ok(Json(products))
}

/// POST /api/admin/products
///
/// # Errors
///
/// 400 when a field is missing or out of range.
#[instrument(skip(state, admin, request), fields(admin = %admin.subject))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(request): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = request.validate()?;
    let product = ProductRepository::new(state.pool()).create(&product).await?;
    tracing::info!(product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/admin/products/{id}
///
/// # Errors
///
/// 400 for invalid fields, 404 for an unknown product.
#[instrument(skip(state, admin, request), fields(admin = %admin.subject))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(request): ApiJson<UpdateProductRequest>,
) -> Result<Json<Product>> {
    let changes = request.validate()?;
    let product = ProductRepository::new(state.pool())
        .update(id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    Ok(Json(product))
}

/// DELETE /api/admin/products/{id}
///
/// # Errors
///
/// 404 for an unknown product.
#[instrument(skip(state, admin), fields(admin = %admin.subject))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<MessageResponse>> {
    if !ProductRepository::new(state.pool()).delete(id).await? {
        return Err(AppError::NotFound("Product not found".to_string()));
    }
    tracing::info!(product_id = %id, "Product deleted");
    Ok(Json(MessageResponse::new("Product deleted successfully")))
}

/// POST /api/admin/products/bulk-delete
///
/// # Errors
///
/// 400 for an empty id list.
#[instrument(skip(state, admin, request), fields(admin = %admin.subject))]
pub async fn bulk_delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(request): ApiJson<BulkDeleteRequest>,
) -> Result<Json<BulkResponse>> {
    require_ids(&request.product_ids)?;
    let count = ProductRepository::new(state.pool())
        .bulk_delete(&request.product_ids)
        .await?;
    tracing::info!(count, "Bulk product delete");
    Ok(Json(BulkResponse::new(count, "products", "deleted")))
}

/// Show or hide many products at once.
///
/// POST /api/admin/products/bulk-update
///
/// # Errors
///
/// 400 for an empty id list or a status other than `active`/`inactive`.
#[instrument(skip(state, admin, request), fields(admin = %admin.subject))]
pub async fn bulk_update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(request): ApiJson<BulkVisibilityRequest>,
) -> Result<Json<BulkResponse>> {
    require_ids(&request.product_ids)?;
    let status: ProductStatus = request
        .status
        .parse()
        .map_err(|_| AppError::Validation("Invalid status".to_string()))?;

    let count = ProductRepository::new(state.pool())
        .bulk_set_active(&request.product_ids, status.is_active())
        .await?;
    tracing::info!(count, ?status, "Bulk product visibility update");
    Ok(Json(BulkResponse::new(count, "products", "updated")))
}
