//! Shared test fixtures: temp-file databases, a ready scheduler, and
//! record builders.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use tempfile::TempDir;

use console::database::{Database, NewMaintenance, NewServer, RecurrencePattern};
use console::scheduler::{MaintenanceActions, MaintenanceScheduler};

pub mod servers {
    pub const WEB_1: &str = "web1";
    pub const DB_1: &str = "db1";
}

pub struct TestContext {
    pub database: Arc<Database>,
    pub scheduler: MaintenanceScheduler,
    // Keeps the sqlite file alive for the test's duration
    _dir: TempDir,
}

pub async fn test_context() -> TestContext {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("console.db");
    let database = Arc::new(
        Database::new(path.to_str().expect("utf-8 temp path"))
            .await
            .expect("open test database"),
    );
    let scheduler =
        MaintenanceScheduler::new(database.clone(), Arc::new(MaintenanceActions::new()));

    TestContext {
        database,
        scheduler,
        _dir: dir,
    }
}

pub fn new_server(name: &str) -> NewServer {
    NewServer {
        name: name.to_string(),
        hostname: format!("{name}.internal"),
        ip_address: "10.0.0.10".to_string(),
        description: None,
    }
}

/// A one-off window starting `start_offset_ms` from now.
pub fn maintenance_window(server_id: i64, start_offset_ms: i64, duration_ms: i64) -> NewMaintenance {
    let start = Utc::now() + Duration::milliseconds(start_offset_ms);
    NewMaintenance {
        server_id,
        title: "OS patching".to_string(),
        description: Some("Apply security updates".to_string()),
        scheduled_start: start,
        scheduled_end: start + Duration::milliseconds(duration_ms),
        recurring: false,
        recurring_pattern: None,
    }
}

/// A recurring window starting `start_offset_ms` from now.
pub fn recurring_window(
    server_id: i64,
    start_offset_ms: i64,
    duration_ms: i64,
    pattern: RecurrencePattern,
) -> NewMaintenance {
    let mut window = maintenance_window(server_id, start_offset_ms, duration_ms);
    window.recurring = true;
    window.recurring_pattern = Some(pattern);
    window
}
