//! Dashboard statistics and scheduler diagnostics endpoints.

use axum::{extract::State, response::Json};
use serde_json::{json, Value};
use tracing::error;

use super::common::{internal_error, ApiResponse, ApiResult};
use crate::constants::dashboard;
use crate::web::AppState;

pub async fn get_dashboard_stats(State(state): State<AppState>) -> ApiResult<Value> {
    let servers = match state.database.server_counts().await {
        Ok(counts) => counts,
        Err(e) => {
            error!("Failed to compute server counts: {}", e);
            return Err(internal_error(e.to_string()));
        }
    };

    let maintenance = match state
        .database
        .maintenance_counts(dashboard::UPCOMING_WINDOW_HOURS)
        .await
    {
        Ok(counts) => counts,
        Err(e) => {
            error!("Failed to compute maintenance counts: {}", e);
            return Err(internal_error(e.to_string()));
        }
    };

    Ok(Json(ApiResponse::success(json!({
        "servers": servers,
        "maintenance": maintenance
    }))))
}

/// Live timer registrations, for the diagnostics view. Read-only; the
/// scheduler never consults this itself.
pub async fn get_scheduled_jobs(State(state): State<AppState>) -> ApiResult<Value> {
    let jobs = state.scheduler.scheduled_jobs();
    Ok(Json(ApiResponse::success(json!(jobs))))
}
