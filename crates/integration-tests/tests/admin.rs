//! Admin customer management and dashboard.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`bazaar migrate`)
//! - The API server running (`cargo run -p bazaar-api`)
//! - `AUTH_JWT_SECRET` matching the server's

#![allow(clippy::unwrap_used)]

use bazaar_integration_tests::{Caller, send};
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn customer_id(caller: &Caller) -> Value {
    let (_, profile) = send(caller.get("/api/users/profile")).await;
    profile["id"].clone()
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_customer_listing_and_deletion() {
    let admin = Caller::admin();
    let customer = Caller::customer();
    let id = customer_id(&customer).await;

    let (status, body) = send(admin.get("/api/admin/customers")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        body["customers"]
            .as_array()
            .unwrap()
            .iter()
            .any(|c| c["id"] == id)
    );

    let (status, _) = send(admin.delete(&format!("/api/admin/customers/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(admin.delete(&format!("/api/admin/customers/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Customer not found");
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_admin_accounts_are_protected() {
    let admin = Caller::admin();
    let other_admin = Caller::admin();
    // Admins get a customer row the first time they use a customer route.
    let admin_id = customer_id(&other_admin).await;

    let (status, body) = send(admin.delete(&format!("/api/admin/customers/{admin_id}"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Cannot delete admin user");

    let (status, body) = send(admin.post(
        "/api/admin/customers/bulk-delete",
        &json!({ "customerIds": [admin_id] }),
    ))
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);

    let (status, body) = send(admin.post(
        "/api/admin/customers/bulk-delete",
        &json!({ "customerIds": [] }),
    ))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Customer IDs are required");
}

#[tokio::test]
#[ignore = "Requires running API server and PostgreSQL"]
async fn test_dashboard_shape() {
    let admin = Caller::admin();
    let (status, stats) = send(admin.get("/api/admin/stats")).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(stats["monthlyRevenue"].as_array().unwrap().len(), 6);
    assert_eq!(stats["orderStats"].as_object().unwrap().len(), 7);
    assert!(stats["todayStats"].is_object());
    assert!(stats["stockAlerts"].is_object());
    assert!(stats["topProducts"].as_array().unwrap().len() <= 5);
}
