//! HTTP middleware and extractors.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, capture errors)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded on the span, echoed in the response)
//! 4. CORS
//!
//! Authentication is not a layer: handlers take [`RequireCustomer`] or
//! [`RequireAdmin`] as an argument.

pub mod auth;
pub mod extract;
pub mod request_id;

pub use auth::{RequireAdmin, RequireCustomer};
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use request_id::request_id_middleware;
