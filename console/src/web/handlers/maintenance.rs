//! Maintenance schedule CRUD and cancellation endpoints.
//!
//! The handlers own window validation (start < end, start in the future);
//! the scheduler is only ever handed ids of rows that already passed it.

use axum::{
    extract::{Path, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use super::common::{bad_request, internal_error, not_found, ApiResponse, ApiResult};
use crate::database::{MaintenanceStatus, NewMaintenance, RecurrencePattern};
use crate::errors::{SchedulerError, ValidationError};
use crate::web::AppState;

#[derive(Deserialize)]
pub struct CreateMaintenanceRequest {
    pub server_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    #[serde(default)]
    pub recurring: bool,
    #[serde(default)]
    pub recurring_pattern: Option<RecurrencePattern>,
}

#[derive(Deserialize)]
pub struct UpdateMaintenanceRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub recurring: Option<bool>,
    pub recurring_pattern: Option<RecurrencePattern>,
}

pub async fn get_all_maintenance(State(state): State<AppState>) -> ApiResult<Value> {
    match state.database.list_maintenance().await {
        Ok(schedules) => Ok(Json(ApiResponse::success(json!(schedules)))),
        Err(e) => {
            error!("Failed to list maintenance schedules: {}", e);
            Err(internal_error(e.to_string()))
        }
    }
}

pub async fn get_maintenance(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> ApiResult<Value> {
    match state.database.get_maintenance_with_server(id).await {
        Ok(Some(schedule)) => Ok(Json(ApiResponse::success(json!(schedule)))),
        Ok(None) => Err(not_found(format!("Maintenance schedule {} not found", id))),
        Err(e) => {
            error!("Failed to get maintenance {}: {}", id, e);
            Err(internal_error(e.to_string()))
        }
    }
}

pub async fn create_maintenance(
    State(state): State<AppState>,
    Json(req): Json<CreateMaintenanceRequest>,
) -> ApiResult<Value> {
    if req.title.trim().is_empty() {
        return Err(bad_request(
            ValidationError::MissingField { field: "title" }.to_string(),
        ));
    }
    if let Err(e) = validate_window(req.scheduled_start, req.scheduled_end) {
        return Err(bad_request(e.to_string()));
    }

    match state.database.get_server(req.server_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(not_found(format!("Server {} not found", req.server_id))),
        Err(e) => {
            error!("Failed to check server {}: {}", req.server_id, e);
            return Err(internal_error(e.to_string()));
        }
    }

    let new_maintenance = NewMaintenance {
        server_id: req.server_id,
        title: req.title,
        description: req.description,
        scheduled_start: req.scheduled_start,
        scheduled_end: req.scheduled_end,
        recurring: req.recurring,
        recurring_pattern: req.recurring_pattern,
    };

    let record = match state.database.create_maintenance(&new_maintenance).await {
        Ok(record) => record,
        Err(e) => {
            error!("Failed to create maintenance schedule: {}", e);
            return Err(internal_error(e.to_string()));
        }
    };

    if let Err(e) = state.scheduler.schedule_maintenance(record.id).await {
        error!("Failed to register timers for maintenance {}: {}", record.id, e);
        return Err(scheduler_error(e));
    }

    info!(
        "Created maintenance {} for server {} ({} -> {})",
        record.id, record.server_id, record.scheduled_start, record.scheduled_end
    );
    Ok(Json(ApiResponse::success(json!(record))))
}

/// Edit a SCHEDULED window. Timers are re-registered through the scheduler's
/// replace-existing semantics, so no explicit cancel is needed and the row
/// stays SCHEDULED throughout.
pub async fn update_maintenance(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(req): Json<UpdateMaintenanceRequest>,
) -> ApiResult<Value> {
    let mut record = match state.database.get_maintenance(id).await {
        Ok(Some(record)) => record,
        Ok(None) => return Err(not_found(format!("Maintenance schedule {} not found", id))),
        Err(e) => {
            error!("Failed to get maintenance {}: {}", id, e);
            return Err(internal_error(e.to_string()));
        }
    };

    if record.status != MaintenanceStatus::Scheduled {
        return Err(bad_request(
            "Can only update scheduled maintenance".to_string(),
        ));
    }

    if let Some(title) = req.title {
        record.title = title;
    }
    if let Some(description) = req.description {
        record.description = Some(description);
    }
    if let Some(scheduled_start) = req.scheduled_start {
        record.scheduled_start = scheduled_start;
    }
    if let Some(scheduled_end) = req.scheduled_end {
        record.scheduled_end = scheduled_end;
    }
    if let Some(recurring) = req.recurring {
        record.recurring = recurring;
    }
    if let Some(pattern) = req.recurring_pattern {
        record.recurring_pattern = Some(pattern);
    }

    if let Err(e) = validate_window(record.scheduled_start, record.scheduled_end) {
        return Err(bad_request(e.to_string()));
    }

    if let Err(e) = state.database.update_maintenance(&record).await {
        error!("Failed to update maintenance {}: {}", id, e);
        return Err(internal_error(e.to_string()));
    }

    if let Err(e) = state.scheduler.schedule_maintenance(id).await {
        error!("Failed to re-register timers for maintenance {}: {}", id, e);
        return Err(scheduler_error(e));
    }

    info!("Updated maintenance {} ({} -> {})", id, record.scheduled_start, record.scheduled_end);
    Ok(Json(ApiResponse::success(json!(record))))
}

pub async fn cancel_maintenance(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> ApiResult<Value> {
    let record = match state.database.get_maintenance(id).await {
        Ok(Some(record)) => record,
        Ok(None) => return Err(not_found(format!("Maintenance schedule {} not found", id))),
        Err(e) => {
            error!("Failed to get maintenance {}: {}", id, e);
            return Err(internal_error(e.to_string()));
        }
    };

    if record.status.is_terminal() {
        return Err(bad_request(
            "Can only cancel scheduled or in-progress maintenance".to_string(),
        ));
    }

    match state.scheduler.cancel_maintenance(id).await {
        Ok(()) => Ok(Json(ApiResponse::success(json!({
            "message": "Maintenance cancelled successfully",
            "maintenance_id": id
        })))),
        Err(e) => {
            error!("Failed to cancel maintenance {}: {}", id, e);
            Err(scheduler_error(e))
        }
    }
}

pub async fn delete_maintenance(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> ApiResult<Value> {
    match state.database.get_maintenance(id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(not_found(format!("Maintenance schedule {} not found", id))),
        Err(e) => {
            error!("Failed to get maintenance {}: {}", id, e);
            return Err(internal_error(e.to_string()));
        }
    }

    // Remove timers (and flip a live row to cancelled) before the row goes.
    if let Err(e) = state.scheduler.cancel_maintenance(id).await {
        error!("Failed to cancel maintenance {} before delete: {}", id, e);
        return Err(scheduler_error(e));
    }

    match state.database.delete_maintenance(id).await {
        Ok(true) => {
            info!("Deleted maintenance schedule {}", id);
            Ok(Json(ApiResponse::success(json!({
                "message": "Maintenance schedule deleted successfully"
            }))))
        }
        Ok(false) => Err(not_found(format!("Maintenance schedule {} not found", id))),
        Err(e) => {
            error!("Failed to delete maintenance {}: {}", id, e);
            Err(internal_error(e.to_string()))
        }
    }
}

fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ValidationError> {
    if start >= end {
        return Err(ValidationError::StartNotBeforeEnd);
    }
    if start <= Utc::now() {
        return Err(ValidationError::StartNotInFuture);
    }
    Ok(())
}

fn scheduler_error(e: SchedulerError) -> (axum::http::StatusCode, Json<ApiResponse<()>>) {
    match e {
        SchedulerError::MaintenanceNotFound { .. } => not_found(e.to_string()),
        SchedulerError::Persistence { .. } => internal_error(e.to_string()),
    }
}
