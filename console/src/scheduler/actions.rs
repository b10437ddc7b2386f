//! Maintenance-action hook invoked on phase transitions.

use anyhow::Result;
use tracing::info;

use super::Phase;
use crate::database::ServerRecord;

/// Collaborator that carries out the operational side of a maintenance
/// window. The console only tracks state; the concrete actions are
/// deployment-specific integration points, and the default implementation
/// logs the transition and succeeds.
pub struct MaintenanceActions;

impl MaintenanceActions {
    pub fn new() -> Self {
        Self
    }

    /// Notify that a phase fired for `server`. Fire-and-forget from the
    /// scheduler's point of view: failures are logged by the caller and
    /// never block or roll back the state transition.
    pub async fn notify(&self, server: &ServerRecord, phase: Phase) -> Result<()> {
        match phase {
            Phase::Start => {
                info!("Starting maintenance actions for {}", server.name);
                // Integration point: stop services, drain the load balancer,
                // send maintenance-start notifications.
            }
            Phase::End => {
                info!("Ending maintenance actions for {}", server.name);
                // Integration point: start services, re-enable the load
                // balancer, run health checks, send recovery notifications.
            }
        }
        Ok(())
    }
}

impl Default for MaintenanceActions {
    fn default() -> Self {
        Self::new()
    }
}
