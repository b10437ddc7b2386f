//! Database layer for the maintenance console.
//!
//! This module provides SQLite persistence for:
//! - Servers (inventory and live status)
//! - Maintenance schedules (windows, lifecycle status, recurrence settings)
//!
//! The module is organized into submodules:
//! - `records` - All record types (entities)
//! - `servers` - Server CRUD and status counters
//! - `maintenance` - Maintenance schedule CRUD and phase-transition writes

mod maintenance;
mod records;
mod servers;

pub use maintenance::MaintenanceCounts;
pub use records::*;
pub use servers::ServerCounts;

use anyhow::Result;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;
use tracing::{error, info};

pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Expose pool for integration test queries
    #[allow(dead_code)]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn new(database_path: &str) -> Result<Self> {
        info!("Initializing database at {}", database_path);

        if let Some(parent) = Path::new(database_path).parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                error!("Failed to create database directory {:?}: {}", parent, e);
                return Err(e.into());
            }
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path);
        let pool = match SqlitePool::connect(&database_url).await {
            Ok(pool) => pool,
            Err(e) => {
                error!("Failed to connect to database {}: {}", database_url, e);
                return Err(e.into());
            }
        };

        let database = Self { pool };
        database.initialize_tables().await?;
        info!("Database initialized");

        Ok(database)
    }

    async fn initialize_tables(&self) -> Result<()> {
        let servers_table_sql = r#"
            CREATE TABLE IF NOT EXISTS servers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                hostname TEXT NOT NULL,
                ip_address TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'online',
                description TEXT,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
        "#;

        if let Err(e) = sqlx::query(servers_table_sql).execute(&self.pool).await {
            error!("Failed to create servers table: {}", e);
            return Err(e.into());
        }

        let maintenance_table_sql = r#"
            CREATE TABLE IF NOT EXISTS maintenance_schedules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                server_id INTEGER NOT NULL REFERENCES servers(id),
                title TEXT NOT NULL,
                description TEXT,
                scheduled_start DATETIME NOT NULL,
                scheduled_end DATETIME NOT NULL,
                actual_start DATETIME,
                actual_end DATETIME,
                status TEXT NOT NULL DEFAULT 'scheduled',
                recurring BOOLEAN NOT NULL DEFAULT 0,
                recurring_pattern TEXT,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
        "#;

        if let Err(e) = sqlx::query(maintenance_table_sql).execute(&self.pool).await {
            error!("Failed to create maintenance_schedules table: {}", e);
            return Err(e.into());
        }

        let server_index_sql = "CREATE INDEX IF NOT EXISTS idx_maintenance_server ON maintenance_schedules(server_id, scheduled_start DESC)";
        if let Err(e) = sqlx::query(server_index_sql).execute(&self.pool).await {
            error!("Failed to create maintenance server index: {}", e);
            return Err(e.into());
        }

        let status_index_sql = "CREATE INDEX IF NOT EXISTS idx_maintenance_status ON maintenance_schedules(status, scheduled_start)";
        if let Err(e) = sqlx::query(status_index_sql).execute(&self.pool).await {
            error!("Failed to create maintenance status index: {}", e);
            return Err(e.into());
        }

        Ok(())
    }
}
