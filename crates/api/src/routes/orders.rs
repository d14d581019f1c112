//! Customer order routes.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use serde::Serialize;
use tracing::instrument;

use bazaar_core::OrderId;

use crate::db::OrderRepository;
use crate::error::Result;
use crate::middleware::{ApiJson, ApiPath, RequireCustomer};
use crate::models::{CreateOrderRequest, OrderDetails, OrderTracking};
use crate::services::orders;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OrderCreatedResponse {
    pub message: &'static str,
    pub order: OrderDetails,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub order: OrderDetails,
}

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderDetails>,
}

/// Place an order.
///
/// POST /api/orders
///
/// # Errors
///
/// 400 for invalid input or insufficient stock, 404 for an unknown product.
#[instrument(skip(state, customer, request), fields(customer_id = %customer.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    ApiJson(request): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderCreatedResponse>)> {
    let store = OrderRepository::new(state.pool());
    let order = orders::create_order(&store, customer.id, request, Utc::now()).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderCreatedResponse {
            message: "Order created successfully",
            order,
        }),
    ))
}

/// The caller's orders, newest first.
///
/// GET /api/orders
///
/// # Errors
///
/// Returns `AppError::Database` if the query fails.
#[instrument(skip(state, customer), fields(customer_id = %customer.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
) -> Result<Json<OrderListResponse>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_customer(customer.id)
        .await?;
    Ok(Json(OrderListResponse { orders }))
}

/// One of the caller's orders.
///
/// GET /api/orders/{order_id}
///
/// # Errors
///
/// 404 when the order does not exist or belongs to someone else.
#[instrument(skip(state, customer), fields(customer_id = %customer.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    ApiPath(order_id): ApiPath<OrderId>,
) -> Result<Json<OrderResponse>> {
    let store = OrderRepository::new(state.pool());
    let order = orders::customer_order(&store, order_id, customer.id).await?;
    Ok(Json(OrderResponse { order }))
}

/// Tracking view of one of the caller's orders.
///
/// GET /api/orders/{order_id}/track
///
/// # Errors
///
/// 404 when the order does not exist or belongs to someone else.
#[instrument(skip(state, customer), fields(customer_id = %customer.id))]
pub async fn track(
    State(state): State<AppState>,
    RequireCustomer(customer): RequireCustomer,
    ApiPath(order_id): ApiPath<OrderId>,
) -> Result<Json<OrderTracking>> {
    let store = OrderRepository::new(state.pool());
    let tracking = orders::track_order(&store, order_id, customer.id).await?;
    Ok(Json(tracking))
}
