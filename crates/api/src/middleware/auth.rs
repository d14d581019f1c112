//! Bearer token extractors.
//!
//! Every protected route takes one of these as an argument:
//!
//! ```rust,ignore
//! async fn list_orders(
//!     State(state): State<AppState>,
//!     RequireCustomer(customer): RequireCustomer,
//! ) -> Result<Json<Value>, AppError> { ... }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::Span;

use crate::db::CustomerRepository;
use crate::error::{AppError, set_sentry_user};
use crate::models::Customer;
use crate::services::auth::{AuthError, Identity, bearer_token};
use crate::state::AppState;

/// Verify the request's bearer token.
fn identify(parts: &Parts, state: &AppState) -> Result<Identity, AuthError> {
    let token = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
        .ok_or(AuthError::MissingToken)?;

    state.verifier().verify(token).inspect_err(|e| {
        tracing::debug!(error = %e, "Bearer token rejected");
    })
}

/// Extractor for an authenticated customer.
///
/// The customer row bound to the token's subject is created on first access
/// and refreshed from the token's claims afterwards.
pub struct RequireCustomer(pub Customer);

impl FromRequestParts<AppState> for RequireCustomer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = identify(parts, state)?;
        let customer = CustomerRepository::new(state.pool())
            .upsert_identity(&identity.into())
            .await?;

        Span::current().record("customer_id", customer.id.as_i32());
        set_sentry_user(&customer.id, Some(customer.email.as_str()));

        Ok(Self(customer))
    }
}

/// Extractor for a caller holding the admin role.
///
/// Admin routes never touch the customer table for the caller itself, so
/// this only verifies the token.
pub struct RequireAdmin(pub Identity);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = identify(parts, state)?;
        if !identity.is_admin {
            tracing::warn!(subject = %identity.subject, "Non-admin attempted admin access");
            return Err(AuthError::Forbidden.into());
        }

        set_sentry_user(&identity.subject, Some(identity.email.as_str()));
        Ok(Self(identity))
    }
}
