//! Admin customer management.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bazaar_core::CustomerId;

use super::BulkResponse;
use crate::db::{CustomerRemoval, CustomerRepository};
use crate::error::{AppError, Result};
use crate::middleware::{ApiJson, ApiPath, RequireAdmin};
use crate::models::CustomerListing;
use crate::routes::MessageResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CustomerListResponse {
    pub customers: Vec<CustomerListing>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub customer_ids: Vec<CustomerId>,
}

/// Non-admin customers with their wishlists.
///
/// GET /api/admin/customers
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<CustomerListResponse>> {
    let customers = CustomerRepository::new(state.pool())
        .list_customers()
        .await?;
    Ok(Json(CustomerListResponse { customers }))
}

/// DELETE /api/admin/customers/{id}
///
/// # Errors
///
/// 404 for an unknown customer, 403 for an admin account.
#[instrument(skip(state, admin), fields(admin = %admin.subject))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<CustomerId>,
) -> Result<Json<MessageResponse>> {
    match CustomerRepository::new(state.pool()).delete(id).await? {
        CustomerRemoval::Deleted => {
            tracing::info!(customer_id = %id, "Customer deleted");
            Ok(Json(MessageResponse::new("Customer deleted successfully")))
        }
        CustomerRemoval::NotFound => Err(AppError::NotFound("Customer not found".to_string())),
        CustomerRemoval::IsAdmin => {
            Err(AppError::Forbidden("Cannot delete admin user".to_string()))
        }
    }
}

/// Delete many customers. Admin accounts in the list are skipped.
///
/// POST /api/admin/customers/bulk-delete
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
    if request.customer_ids.is_empty() {
        return Err(AppError::Validation(
            "Customer IDs are required".to_string(),
        ));
    }
    let count = CustomerRepository::new(state.pool())
        .bulk_delete(&request.customer_ids)
        .await?;
    tracing::info!(count, "Bulk customer delete");
    Ok(Json(BulkResponse::new(count, "customers", "deleted")))
}
