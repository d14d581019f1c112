//! Integration tests for the Bazaar API.
//!
//! # Running Tests
//!
//! ```bash
//! # Prepare the database and start the server
//! cargo run -p bazaar-cli -- migrate
//! cargo run -p bazaar-api
//!
//! # Run integration tests (ignored by default)
//! cargo test -p bazaar-integration-tests -- --ignored
//! ```
//!
//! The server must use an HS256 `AUTH_JWT_SECRET`; the tests read the same
//! variable to sign their own tokens. `BAZAAR_API_URL` points at the server
//! (default `http://localhost:5000`).

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use bazaar_api::services::auth::{Claims, issue_development_token};
use chrono::Duration;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    dotenvy::dotenv().ok();
    std::env::var("BAZAAR_API_URL").unwrap_or_else(|_| "http://localhost:5000".to_string())
}

fn secret() -> SecretString {
    dotenvy::dotenv().ok();
    std::env::var("AUTH_JWT_SECRET")
        .map(SecretString::from)
        .expect("AUTH_JWT_SECRET must match the server's")
}

fn admin_role() -> String {
    std::env::var("AUTH_ADMIN_ROLE").unwrap_or_else(|_| "admin".to_string())
}

/// A caller with its own identity, so tests never share customer rows.
pub struct Caller {
    pub client: Client,
    pub subject: String,
    token: String,
}

impl Caller {
    fn new(prefix: &str, admin: bool) -> Self {
        let subject = format!("{prefix}-{}", Uuid::new_v4());
        let claims = Claims {
            sub: subject.clone(),
            exp: 0,
            iat: None,
            iss: std::env::var("AUTH_JWT_ISSUER").ok(),
            aud: std::env::var("AUTH_JWT_AUDIENCE").ok().map(Value::String),
            email: Some(format!("{subject}@integration.test")),
            name: Some(format!("Test {prefix}")),
            picture: None,
            roles: if admin { vec![admin_role()] } else { Vec::new() },
        };
        let token = issue_development_token(&secret(), claims, Duration::minutes(10))
            .expect("Failed to sign test token");

        Self {
            client: Client::new(),
            subject,
            token,
        }
    }

    /// A fresh customer identity.
    #[must_use]
    pub fn customer() -> Self {
        Self::new("customer", false)
    }

    /// A fresh admin identity.
    #[must_use]
    pub fn admin() -> Self {
        Self::new("admin", true)
    }

    #[must_use]
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(format!("{}{path}", base_url()))
            .bearer_auth(&self.token)
    }

    #[must_use]
    pub fn post(&self, path: &str, body: &Value) -> RequestBuilder {
        self.client
            .post(format!("{}{path}", base_url()))
            .bearer_auth(&self.token)
            .json(body)
    }

    #[must_use]
    pub fn put(&self, path: &str, body: &Value) -> RequestBuilder {
        self.client
            .put(format!("{}{path}", base_url()))
            .bearer_auth(&self.token)
            .json(body)
    }

    #[must_use]
    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client
            .delete(format!("{}{path}", base_url()))
            .bearer_auth(&self.token)
    }
}

/// Send a request and return its status with the JSON body.
pub async fn send(request: RequestBuilder) -> (StatusCode, Value) {
    let response: Response = request.send().await.expect("Request failed");
    let status = response.status();
    let body = response.json().await.unwrap_or(Value::Null);
    (status, body)
}

/// Create an active product through the admin API and return its JSON.
pub async fn create_product(admin: &Caller, category: &str, price: &str, stock: i64) -> Value {
    let (status, product) = send(admin.post(
        "/api/admin/products",
        &json!({
            "name": format!("Integration {}", Uuid::new_v4()),
            "description": "Created by the integration tests",
            "price": price,
            "stock": stock,
            "category": category,
            "images": ["https://images.bazaar.test/integration.jpg"],
        }),
    ))
    .await;
    assert_eq!(status, StatusCode::CREATED, "{product}");
    product
}

/// A complete shipping address body.
#[must_use]
pub fn shipping_address() -> Value {
    json!({
        "fullName": "Ada Tester",
        "phoneNumber": "+1 555 0100",
        "streetAddress": "1 Integration Way",
        "city": "Springfield",
        "state": "IL",
        "zipCode": "62701",
    })
}
