// File: console/src/main.rs
use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use console::config::ConfigManager;
use console::database::Database;
use console::scheduler::{MaintenanceActions, MaintenanceScheduler};
use console::web::start_web_server;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with reduced verbosity
    let env_filter = EnvFilter::from_default_env()
        .add_directive("console=info".parse()?)
        .add_directive("tower_http=warn".parse()?)
        .add_directive("hyper=warn".parse()?)
        .add_directive("sqlx=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting Server Maintenance Console");

    // Load configuration
    let config_manager = ConfigManager::new("config").await?;
    let config = config_manager.get_current_config();

    // Initialize database
    let database = Arc::new(Database::new(&config.database_path).await?);

    // Initialize scheduler with the stubbed action hook
    let actions = Arc::new(MaintenanceActions::new());
    let scheduler = MaintenanceScheduler::new(database.clone(), actions);

    // Rebuild timers from persisted state before the API accepts any
    // schedule/cancel calls.
    let restored = scheduler.restore_pending().await?;
    info!(
        "Startup reconciliation complete, {} maintenance windows rescheduled",
        restored
    );

    // Start web server
    start_web_server(config, database, scheduler).await?;

    Ok(())
}
