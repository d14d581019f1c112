//! Bazaar Core - Shared domain types.
//!
//! This crate provides the types used across all Bazaar components:
//! - `api` - REST backend for the storefront app and the admin dashboard
//! - `cli` - Command-line tools for migrations, seeding and dev tokens
//!
//! # Architecture
//!
//! The core crate contains only types and pure domain rules - no I/O, no
//! database access, no HTTP clients. Order status progression, status
//! timestamps, price arithmetic and address validation all live here so
//! they can be tested without a database.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, prices, emails, order statuses and timelines

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
