//! Admin order management.

use axum::{Json, extract::State};
use chrono::Utc;
use serde::Serialize;
use tracing::instrument;

use bazaar_core::OrderId;

use super::BulkResponse;
use crate::db::OrderRepository;
use crate::error::Result;
use crate::middleware::{ApiJson, ApiPath, RequireAdmin};
use crate::models::{BulkStatusRequest, OrderDetails, UpdateStatusRequest};
use crate::services::orders;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderDetails>,
}

#[derive(Debug, Serialize)]
pub struct OrderUpdatedResponse {
    pub message: &'static str,
    pub order: OrderDetails,
}

/// Every order with its customer and items, newest first.
///
/// GET /api/admin/orders
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<OrderListResponse>> {
    let orders = OrderRepository::new(state.pool()).list_all().await?;
    Ok(Json(OrderListResponse { orders }))
}

/// PUT /api/admin/orders/{order_id}
///
/// # Errors
///
/// 400 for an unknown status (or a disallowed move when strict transitions
/// are on), 404 for an unknown order.
#[instrument(skip(state, admin, request), fields(admin = %admin.subject))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(order_id): ApiPath<OrderId>,
    ApiJson(request): ApiJson<UpdateStatusRequest>,
) -> Result<Json<OrderUpdatedResponse>> {
    let store = OrderRepository::new(state.pool());
    let order = orders::update_status(
        &store,
        order_id,
        &request.status,
        state.config().transitions,
        Utc::now(),
    )
    .await?;

    Ok(Json(OrderUpdatedResponse {
        message: "Order status updated successfully",
        order,
    }))
}

/// POST /api/admin/orders/bulk-update
///
/// # Errors
///
/// 400 for an empty id list or an unknown status.
#[instrument(skip(state, admin, request), fields(admin = %admin.subject))]
pub async fn bulk_update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(request): ApiJson<BulkStatusRequest>,
) -> Result<Json<BulkResponse>> {
    let store = OrderRepository::new(state.pool());
    let count =
        orders::bulk_update_status(&store, &request.order_ids, &request.status, Utc::now())
            .await?;
    Ok(Json(BulkResponse::new(count, "orders", "updated")))
}
