// File: console/src/web/server.rs
use crate::config::Config;
use crate::database::Database;
use crate::scheduler::MaintenanceScheduler;
use crate::web::{handlers, AppState};
use anyhow::Result;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub async fn start_web_server(
    config: Arc<Config>,
    database: Arc<Database>,
    scheduler: MaintenanceScheduler,
) -> Result<()> {
    let state = AppState {
        config: config.clone(),
        database,
        scheduler,
    };

    let app = create_router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // === SERVER MANAGEMENT ROUTES ===
        .route("/api/servers", get(handlers::get_all_servers))
        .route("/api/servers", post(handlers::create_server))
        .route("/api/servers/import", post(handlers::import_servers))
        .route("/api/servers/{id}", get(handlers::get_server))
        .route("/api/servers/{id}", put(handlers::update_server))
        .route("/api/servers/{id}", delete(handlers::delete_server))
        // === MAINTENANCE SCHEDULE ROUTES ===
        .route("/api/maintenance", get(handlers::get_all_maintenance))
        .route("/api/maintenance", post(handlers::create_maintenance))
        .route("/api/maintenance/{id}", get(handlers::get_maintenance))
        .route("/api/maintenance/{id}", put(handlers::update_maintenance))
        .route("/api/maintenance/{id}", delete(handlers::delete_maintenance))
        .route(
            "/api/maintenance/{id}/cancel",
            post(handlers::cancel_maintenance),
        )
        // === DASHBOARD AND DIAGNOSTICS ROUTES ===
        .route("/api/dashboard/stats", get(handlers::get_dashboard_stats))
        .route("/api/scheduler/jobs", get(handlers::get_scheduled_jobs))
        // Add middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
