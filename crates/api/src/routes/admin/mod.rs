//! Admin route handlers.
//!
//! Every handler takes [`RequireAdmin`](crate::middleware::RequireAdmin),
//! so callers without the admin role get 401 or 403 before any work runs.

pub mod customers;
pub mod orders;
pub mod products;
pub mod stats;

use serde::Serialize;

/// Body returned by bulk operations.
#[derive(Debug, Serialize)]
pub struct BulkResponse {
    pub message: String,
    pub count: u64,
}

impl BulkResponse {
    fn new(count: u64, what: &str, verb: &str) -> Self {
        Self {
            message: format!("{count} {what} {verb} successfully"),
            count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_response_message() {
        let response = BulkResponse::new(3, "products", "deleted");
        assert_eq!(response.message, "3 products deleted successfully");
        assert_eq!(response.count, 3);
    }
}
