//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /api/health                        - Liveness
//! GET  /api/health/ready                  - Readiness (database reachable)
//!
//! # Catalog (public)
//! GET  /api/products                      - Paged active products
//! GET  /api/products/categories           - Distinct categories
//! GET  /api/products/{id}                 - Active product
//!
//! # Orders (customer)
//! POST /api/orders                        - Place an order
//! GET  /api/orders                        - Own orders
//! GET  /api/orders/{order_id}             - Own order
//! GET  /api/orders/{order_id}/track       - Tracking projection
//!
//! # Self-service (customer)
//! GET  /api/users/profile                 - Profile
//! PUT  /api/users/profile                 - Update profile
//! GET  /api/users/addresses               - Saved addresses
//! POST /api/users/addresses               - Add address
//! PUT  /api/users/addresses/{address_id}  - Update address
//! DELETE /api/users/addresses/{address_id} - Remove address
//! GET  /api/users/wishlist                - Wishlist
//! POST /api/users/wishlist                - Add to wishlist
//! DELETE /api/users/wishlist/{product_id} - Remove from wishlist
//!
//! # Admin
//! GET  /api/admin/products                - All products
//! POST /api/admin/products                - Create product
//! PUT  /api/admin/products/{id}           - Update product
//! DELETE /api/admin/products/{id}         - Delete product
//! POST /api/admin/products/bulk-delete    - Delete many products
//! POST /api/admin/products/bulk-update    - Show/hide many products
//! GET  /api/admin/orders                  - All orders
//! PUT  /api/admin/orders/{order_id}       - Set order status
//! POST /api/admin/orders/bulk-update      - Set status on many orders
//! GET  /api/admin/customers               - Non-admin customers
//! DELETE /api/admin/customers/{id}        - Delete customer
//! POST /api/admin/customers/bulk-delete   - Delete many customers
//! GET  /api/admin/stats                   - Dashboard aggregates
//! ```

pub mod admin;
pub mod health;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{get, post, put},
};
use serde::Serialize;

use crate::state::AppState;

/// Body of responses that only carry a confirmation.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Create the public catalog router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/categories", get(products::categories))
        .route("/{id}", get(products::show))
}

/// Create the customer order router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/{order_id}", get(orders::show))
        .route("/{order_id}/track", get(orders::track))
}

/// Create the customer self-service router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(users::profile).put(users::update_profile))
        .route(
            "/addresses",
            get(users::addresses).post(users::add_address),
        )
        .route(
            "/addresses/{address_id}",
            put(users::update_address).delete(users::delete_address),
        )
        .route(
            "/wishlist",
            get(users::wishlist).post(users::add_to_wishlist),
        )
        .route(
            "/wishlist/{product_id}",
            axum::routing::delete(users::remove_from_wishlist),
        )
}

/// Create the admin router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            get(admin::products::index).post(admin::products::create),
        )
        .route(
            "/products/{id}",
            put(admin::products::update).delete(admin::products::delete),
        )
        .route("/products/bulk-delete", post(admin::products::bulk_delete))
        .route("/products/bulk-update", post(admin::products::bulk_update))
        .route("/orders", get(admin::orders::index))
        .route("/orders/{order_id}", put(admin::orders::update_status))
        .route("/orders/bulk-update", post(admin::orders::bulk_update))
        .route("/customers", get(admin::customers::index))
        .route(
            "/customers/{id}",
            axum::routing::delete(admin::customers::delete),
        )
        .route("/customers/bulk-delete", post(admin::customers::bulk_delete))
        .route("/stats", get(admin::stats::dashboard))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/health/ready", get(health::ready))
        .nest("/api/products", product_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/users", user_routes())
        .nest("/api/admin", admin_routes())
}
