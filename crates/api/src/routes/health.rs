//! Health check endpoints.

use axum::{Json, extract::State, http::StatusCode};

use super::MessageResponse;
use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Answers as long as the process is serving. Does not check dependencies.
pub async fn health() -> Json<MessageResponse> {
    Json(MessageResponse::new("success"))
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
pub async fn ready(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
