//! Admin dashboard.

use axum::{Json, extract::State};
use chrono::Utc;
use tracing::instrument;

use crate::db::StatsRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{DashboardStats, DashboardWindows};
use crate::state::AppState;

/// GET /api/admin/stats
///
/// # Errors
///
/// Returns `AppError::Database` if an aggregate query fails.
#[instrument(skip(state, _admin))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<DashboardStats>> {
    let windows = DashboardWindows::at(Utc::now())
        .ok_or_else(|| AppError::Internal("dashboard window out of range".to_string()))?;
    let snapshot = StatsRepository::new(state.pool()).snapshot(&windows).await?;
    Ok(Json(DashboardStats::build(snapshot, &windows)))
}
