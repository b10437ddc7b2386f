// File: console/src/scheduler/operations.rs
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::timers::JobTimerTable;
use super::{MaintenanceActions, Phase, ScheduledJob};
use crate::database::{Database, MaintenanceRecord, MaintenanceStatus, NewMaintenance};
use crate::errors::SchedulerError;

pub struct MaintenanceScheduler {
    database: Arc<Database>,
    actions: Arc<MaintenanceActions>,
    timers: JobTimerTable,
    reconciled: Arc<AtomicBool>,
}

impl MaintenanceScheduler {
    pub fn new(database: Arc<Database>, actions: Arc<MaintenanceActions>) -> Self {
        Self {
            database,
            actions,
            timers: JobTimerTable::new(),
            reconciled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Rebuild timers from persisted SCHEDULED rows after a restart. Runs
    /// exactly once per process; callers invoke it before the web server
    /// starts accepting schedule/cancel calls. Rows whose start already
    /// elapsed while the process was down are left SCHEDULED without timers
    /// and need an operator to reschedule or cancel them.
    pub async fn restore_pending(&self) -> Result<usize> {
        if self.reconciled.swap(true, Ordering::SeqCst) {
            warn!("Startup reconciliation already ran, skipping");
            return Ok(0);
        }

        let scheduled = self
            .database
            .list_maintenance_by_status(MaintenanceStatus::Scheduled)
            .await?;

        let now = Utc::now();
        let mut restored = 0usize;
        for record in &scheduled {
            if record.scheduled_start > now {
                self.register_record(record);
                restored += 1;
            } else {
                warn!(
                    "Maintenance {} ('{}') missed its start at {} while the process was down, leaving it scheduled without timers",
                    record.id, record.title, record.scheduled_start
                );
            }
        }

        info!(
            "Startup reconciliation restored timers for {} of {} scheduled maintenance windows",
            restored,
            scheduled.len()
        );
        Ok(restored)
    }

    /// Register (or re-register) both phase timers for a maintenance record.
    /// Fails with `MaintenanceNotFound` when the id has no row.
    pub async fn schedule_maintenance(&self, maintenance_id: i64) -> Result<(), SchedulerError> {
        let record = self
            .database
            .get_maintenance(maintenance_id)
            .await
            .map_err(|e| SchedulerError::Persistence {
                reason: e.to_string(),
            })?
            .ok_or(SchedulerError::MaintenanceNotFound { maintenance_id })?;

        self.register_record(&record);
        Ok(())
    }

    /// Remove both phase timers for the id (no-op for missing keys) and flip
    /// a SCHEDULED or IN_PROGRESS row to CANCELLED. This is the only path by
    /// which a maintenance record reaches CANCELLED.
    pub async fn cancel_maintenance(&self, maintenance_id: i64) -> Result<(), SchedulerError> {
        self.timers.cancel(&(maintenance_id, Phase::Start));
        self.timers.cancel(&(maintenance_id, Phase::End));

        let cancelled = self
            .database
            .mark_maintenance_cancelled(maintenance_id)
            .await
            .map_err(|e| SchedulerError::Persistence {
                reason: e.to_string(),
            })?;

        if cancelled {
            info!("Cancelled maintenance {}", maintenance_id);
        } else {
            debug!(
                "Cancel of maintenance {} changed nothing (missing or already terminal)",
                maintenance_id
            );
        }
        Ok(())
    }

    /// Diagnostic view of every live timer. Not used for control decisions.
    pub fn scheduled_jobs(&self) -> Vec<ScheduledJob> {
        self.timers
            .pending()
            .into_iter()
            .map(|((maintenance_id, phase), fire_at)| ScheduledJob {
                maintenance_id,
                phase,
                fire_at,
            })
            .collect()
    }

    fn register_record(&self, record: &MaintenanceRecord) {
        let id = record.id;

        let scheduler = self.clone();
        self.timers
            .register((id, Phase::Start), record.scheduled_start, async move {
                scheduler.start_fire(id).await;
            });

        let scheduler = self.clone();
        self.timers
            .register((id, Phase::End), record.scheduled_end, async move {
                scheduler.end_fire(id).await;
            });

        info!(
            "Registered timers for maintenance {} ({} -> {})",
            id, record.scheduled_start, record.scheduled_end
        );
    }

    /// Start-timer callback. Errors are logged, never propagated: there is
    /// no caller to report to, and a failed fire must not take down the
    /// timer tasks. On persistence failure the record is left in its
    /// pre-fire state with no retry.
    async fn start_fire(&self, maintenance_id: i64) {
        let record = match self.database.get_maintenance(maintenance_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                error!("Maintenance {} not found at start fire", maintenance_id);
                return;
            }
            Err(e) => {
                error!(
                    "Failed to load maintenance {} at start fire: {}",
                    maintenance_id, e
                );
                return;
            }
        };

        let server = match self.database.get_server(record.server_id).await {
            Ok(Some(server)) => server,
            Ok(None) => {
                error!(
                    "Server {} not found for maintenance {} at start fire",
                    record.server_id, maintenance_id
                );
                return;
            }
            Err(e) => {
                error!(
                    "Failed to load server {} at start fire: {}",
                    record.server_id, e
                );
                return;
            }
        };

        if let Err(e) = self
            .database
            .apply_start_transition(maintenance_id, record.server_id, Utc::now())
            .await
        {
            error!(
                "Failed to persist start transition for maintenance {}: {}",
                maintenance_id, e
            );
            return;
        }

        info!(
            "Started maintenance '{}' for server {}",
            record.title, server.name
        );

        if let Err(e) = self.actions.notify(&server, Phase::Start).await {
            warn!(
                "Maintenance action hook failed for {} (start): {}",
                server.name, e
            );
        }
    }

    /// End-timer callback. Same error policy as the start fire; additionally
    /// runs recurrence generation, whose failure never retro-fails the
    /// completed transition.
    async fn end_fire(&self, maintenance_id: i64) {
        let record = match self.database.get_maintenance(maintenance_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                error!("Maintenance {} not found at end fire", maintenance_id);
                return;
            }
            Err(e) => {
                error!(
                    "Failed to load maintenance {} at end fire: {}",
                    maintenance_id, e
                );
                return;
            }
        };

        let server = match self.database.get_server(record.server_id).await {
            Ok(Some(server)) => server,
            Ok(None) => {
                error!(
                    "Server {} not found for maintenance {} at end fire",
                    record.server_id, maintenance_id
                );
                return;
            }
            Err(e) => {
                error!(
                    "Failed to load server {} at end fire: {}",
                    record.server_id, e
                );
                return;
            }
        };

        if let Err(e) = self
            .database
            .apply_end_transition(maintenance_id, record.server_id, Utc::now())
            .await
        {
            error!(
                "Failed to persist end transition for maintenance {}: {}",
                maintenance_id, e
            );
            return;
        }

        info!(
            "Completed maintenance '{}' for server {}",
            record.title, server.name
        );

        if let Err(e) = self.actions.notify(&server, Phase::End).await {
            warn!(
                "Maintenance action hook failed for {} (end): {}",
                server.name, e
            );
        }

        if record.recurring {
            if let Err(e) = self.schedule_next_occurrence(&record).await {
                error!(
                    "Failed to schedule next occurrence of maintenance {}: {}",
                    maintenance_id, e
                );
            }
        }
    }

    /// Spawn the successor of a just-completed recurring window: same
    /// server, title, and duration, shifted by the pattern's fixed offset.
    /// A successor whose start would not be in the future is skipped.
    async fn schedule_next_occurrence(&self, record: &MaintenanceRecord) -> Result<Option<i64>> {
        let Some(pattern) = record.recurring_pattern else {
            return Ok(None);
        };

        let next_start = record.scheduled_start + pattern.offset();
        if next_start <= Utc::now() {
            debug!(
                "Next {} occurrence of maintenance {} at {} already elapsed, not recurring",
                pattern.as_str(),
                record.id,
                next_start
            );
            return Ok(None);
        }

        let duration = record.scheduled_end - record.scheduled_start;
        let successor = self
            .database
            .create_maintenance(&NewMaintenance {
                server_id: record.server_id,
                title: record.title.clone(),
                description: record.description.clone(),
                scheduled_start: next_start,
                scheduled_end: next_start + duration,
                recurring: true,
                recurring_pattern: Some(pattern),
            })
            .await?;

        self.register_record(&successor);
        info!(
            "Scheduled recurring maintenance {} (follows {}) starting {}",
            successor.id, record.id, next_start
        );
        Ok(Some(successor.id))
    }
}

impl Clone for MaintenanceScheduler {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            actions: self.actions.clone(),
            timers: self.timers.clone(),
            reconciled: self.reconciled.clone(),
        }
    }
}
