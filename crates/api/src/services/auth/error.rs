//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur while authenticating a request.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization: Bearer` header.
    #[error("missing bearer token")]
    MissingToken,

    /// Signature, issuer, audience or shape check failed.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The token's `exp` is in the past.
    #[error("token expired")]
    ExpiredToken,

    /// A claim this service needs is absent or malformed.
    #[error("token is missing the `{0}` claim")]
    MissingClaim(&'static str),

    /// The caller is authenticated but lacks the admin role.
    #[error("admin access required")]
    Forbidden,

    /// The configured verification key could not be loaded.
    #[error("invalid verification key: {0}")]
    InvalidKey(String),

    /// Token signing failed.
    #[error("token signing failed: {0}")]
    Signing(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
