//! Timer-driven scheduling engine for maintenance windows.
//!
//! This module turns persisted maintenance schedules into timed state
//! transitions:
//! - **Two timers per window**: independent start and end timers, so a
//!   process restart mid-window still fires the end transition
//! - **Replace-existing registration**: re-scheduling an edited record never
//!   leaves two live timers for the same key
//! - **Startup reconciliation**: timers are rebuilt from SCHEDULED rows once
//!   per process, before the API accepts scheduling calls
//! - **Recurrence**: completing a recurring window spawns its successor at a
//!   fixed daily/weekly/monthly offset
//!
//! Timers are native delayed tasks owned by the in-memory [`JobTimerTable`];
//! nothing about pending timers is persisted.

pub mod actions;
pub mod operations;
pub mod timers;

pub use actions::MaintenanceActions;
pub use operations::MaintenanceScheduler;
pub use timers::JobTimerTable;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the two timed transitions attached to a maintenance window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Start,
    End,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Start => "start",
            Phase::End => "end",
        }
    }
}

/// Timer table key: at most one live timer per maintenance window and phase.
pub type JobKey = (i64, Phase);

/// Read-only view of one pending timer, for the diagnostics endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledJob {
    pub maintenance_id: i64,
    pub phase: Phase,
    pub fire_at: DateTime<Utc>,
}
