//! Public catalog routes.

use axum::{Json, extract::State};
use tracing::instrument;

use bazaar_core::ProductId;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::{ApiPath, ApiQuery};
use crate::models::{CatalogFilter, CatalogQuery, Product, ProductPage};
use crate::state::AppState;

/// A page of active products, optionally filtered by category and search term.
///
/// GET /api/products
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CatalogQuery>,
) -> Result<Json<ProductPage>> {
    let filter = CatalogFilter::from(query);
    let page = ProductRepository::new(state.pool())
        .list_active(&filter)
        .await?;
    Ok(Json(page))
}

/// An active product.
///
/// GET /api/products/{id}
///
/// # Errors
///
/// Returns `AppError::NotFound` if the product is missing or hidden.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get_active(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

/// Distinct categories of active products.
///
/// GET /api/products/categories
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let categories = ProductRepository::new(state.pool()).categories().await?;
    Ok(Json(categories))
}
