//! Business logic services for the API.
//!
//! # Services
//!
//! - `auth` - Bearer token verification against the identity provider's key
//! - `orders` - Order lifecycle (checkout, status transitions, tracking)

pub mod auth;
pub mod orders;
