//! Server CRUD and bulk import endpoints.

use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use super::common::{bad_request, conflict, internal_error, not_found, ApiResponse, ApiResult};
use crate::database::{NewServer, ServerStatus};
use crate::errors::ValidationError;
use crate::import;
use crate::web::AppState;

#[derive(Deserialize)]
pub struct CreateServerRequest {
    pub name: String,
    pub hostname: String,
    pub ip_address: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateServerRequest {
    pub name: Option<String>,
    pub hostname: Option<String>,
    pub ip_address: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct ImportQuery {
    pub format: Option<String>,
}

pub async fn get_all_servers(State(state): State<AppState>) -> ApiResult<Value> {
    match state.database.list_servers().await {
        Ok(servers) => Ok(Json(ApiResponse::success(json!(servers)))),
        Err(e) => {
            error!("Failed to list servers: {}", e);
            Err(internal_error(e.to_string()))
        }
    }
}

pub async fn get_server(Path(id): Path<i64>, State(state): State<AppState>) -> ApiResult<Value> {
    match state.database.get_server(id).await {
        Ok(Some(server)) => Ok(Json(ApiResponse::success(json!(server)))),
        Ok(None) => Err(not_found(format!("Server {} not found", id))),
        Err(e) => {
            error!("Failed to get server {}: {}", id, e);
            Err(internal_error(e.to_string()))
        }
    }
}

pub async fn create_server(
    State(state): State<AppState>,
    Json(req): Json<CreateServerRequest>,
) -> ApiResult<Value> {
    if let Err(e) = validate_create_server(&req) {
        return Err(bad_request(e.to_string()));
    }

    match state.database.get_server_by_name(&req.name).await {
        Ok(Some(_)) => {
            return Err(conflict(format!(
                "Server with name '{}' already exists",
                req.name
            )));
        }
        Ok(None) => {}
        Err(e) => {
            error!("Failed to check server existence: {}", e);
            return Err(internal_error(e.to_string()));
        }
    }

    let new_server = NewServer {
        name: req.name,
        hostname: req.hostname,
        ip_address: req.ip_address,
        description: req.description,
    };

    match state.database.create_server(&new_server).await {
        Ok(server) => {
            info!("Created server {} ({})", server.name, server.id);
            Ok(Json(ApiResponse::success(json!(server))))
        }
        Err(e) => {
            error!("Failed to create server: {}", e);
            Err(internal_error(e.to_string()))
        }
    }
}

pub async fn update_server(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(req): Json<UpdateServerRequest>,
) -> ApiResult<Value> {
    let mut server = match state.database.get_server(id).await {
        Ok(Some(server)) => server,
        Ok(None) => return Err(not_found(format!("Server {} not found", id))),
        Err(e) => {
            error!("Failed to get server {}: {}", id, e);
            return Err(internal_error(e.to_string()));
        }
    };

    if let Some(name) = req.name {
        server.name = name;
    }
    if let Some(hostname) = req.hostname {
        server.hostname = hostname;
    }
    if let Some(ip_address) = req.ip_address {
        server.ip_address = ip_address;
    }
    if let Some(description) = req.description {
        server.description = Some(description);
    }
    if let Some(status) = req.status {
        server.status = match status.parse::<ServerStatus>() {
            Ok(status) => status,
            Err(e) => return Err(bad_request(e.to_string())),
        };
    }

    match state.database.update_server(&server).await {
        Ok(()) => Ok(Json(ApiResponse::success(json!(server)))),
        Err(e) => {
            error!("Failed to update server {}: {}", id, e);
            Err(internal_error(e.to_string()))
        }
    }
}

/// Delete a server. Pending timers for any of its schedules are cancelled
/// first, so the in-memory table never points at deleted rows; the schedules
/// themselves go with the server.
pub async fn delete_server(Path(id): Path<i64>, State(state): State<AppState>) -> ApiResult<Value> {
    let server = match state.database.get_server(id).await {
        Ok(Some(server)) => server,
        Ok(None) => return Err(not_found(format!("Server {} not found", id))),
        Err(e) => {
            error!("Failed to get server {}: {}", id, e);
            return Err(internal_error(e.to_string()));
        }
    };

    let schedules = match state.database.list_maintenance_for_server(id).await {
        Ok(schedules) => schedules,
        Err(e) => {
            error!("Failed to list schedules for server {}: {}", id, e);
            return Err(internal_error(e.to_string()));
        }
    };

    for schedule in &schedules {
        if !schedule.status.is_terminal() {
            if let Err(e) = state.scheduler.cancel_maintenance(schedule.id).await {
                error!(
                    "Failed to cancel maintenance {} while deleting server {}: {}",
                    schedule.id, id, e
                );
                return Err(internal_error(e.to_string()));
            }
        }
    }

    match state.database.delete_server(id).await {
        Ok(true) => {
            info!("Deleted server {} ({})", server.name, id);
            Ok(Json(ApiResponse::success(json!({
                "message": "Server deleted successfully",
                "cancelled_schedules": schedules.len()
            }))))
        }
        Ok(false) => Err(not_found(format!("Server {} not found", id))),
        Err(e) => {
            error!("Failed to delete server {}: {}", id, e);
            Err(internal_error(e.to_string()))
        }
    }
}

/// Bulk import servers from a CSV or JSON request body. Rows that fail
/// validation or collide with existing names are reported but do not abort
/// the batch.
pub async fn import_servers(
    State(state): State<AppState>,
    Query(query): Query<ImportQuery>,
    body: String,
) -> ApiResult<Value> {
    let (parsed, mut errors) = match query.format.as_deref() {
        Some("csv") => import::parse_csv_servers(&body),
        Some("json") => import::parse_json_servers(&body),
        _ => {
            return Err(bad_request(
                "Unsupported import format. Use format=csv or format=json".to_string(),
            ));
        }
    };

    let mut success_count = 0usize;
    for server in parsed {
        match state.database.get_server_by_name(&server.name).await {
            Ok(Some(_)) => {
                errors.push(format!("Server '{}' already exists", server.name));
                continue;
            }
            Ok(None) => {}
            Err(e) => {
                errors.push(format!("Error importing '{}': {}", server.name, e));
                continue;
            }
        }

        match state.database.create_server(&server).await {
            Ok(_) => success_count += 1,
            Err(e) => errors.push(format!("Error importing '{}': {}", server.name, e)),
        }
    }

    info!(
        "Imported {} servers ({} errors)",
        success_count,
        errors.len()
    );
    Ok(Json(ApiResponse::success(json!({
        "success_count": success_count,
        "error_count": errors.len(),
        "errors": errors,
        "message": format!("Successfully imported {} servers", success_count)
    }))))
}

fn validate_create_server(req: &CreateServerRequest) -> Result<(), ValidationError> {
    if req.name.trim().is_empty() {
        return Err(ValidationError::MissingField { field: "name" });
    }
    if req.hostname.trim().is_empty() {
        return Err(ValidationError::MissingField { field: "hostname" });
    }
    if req.ip_address.trim().is_empty() {
        return Err(ValidationError::MissingField { field: "ip_address" });
    }
    Ok(())
}
