//! Custom error types for the maintenance console.
//!
//! The storage layer reports failures through `anyhow`; these types cover the
//! two places where callers need to branch on the failure: the scheduler
//! boundary (missing record vs. storage failure) and API-layer validation.

use std::fmt;

/// Errors surfaced by the scheduler registration API.
#[derive(Debug)]
pub enum SchedulerError {
    /// The referenced maintenance record does not exist
    MaintenanceNotFound { maintenance_id: i64 },

    /// Storage failure while loading or persisting scheduler state
    Persistence { reason: String },
}

/// Request validation errors, owned by the API layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty
    MissingField { field: &'static str },

    /// scheduled_start is not strictly before scheduled_end
    StartNotBeforeEnd,

    /// scheduled_start is not strictly in the future
    StartNotInFuture,

    /// Unknown status string
    InvalidStatus { value: String },

    /// Unknown recurrence pattern string
    InvalidPattern { value: String },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerError::MaintenanceNotFound { maintenance_id } => {
                write!(f, "Maintenance schedule {} not found", maintenance_id)
            }
            SchedulerError::Persistence { reason } => {
                write!(f, "Scheduler persistence error: {}", reason)
            }
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingField { field } => {
                write!(f, "Missing required field: {}", field)
            }
            ValidationError::StartNotBeforeEnd => {
                write!(f, "Start time must be before end time")
            }
            ValidationError::StartNotInFuture => {
                write!(f, "Start time must be in the future")
            }
            ValidationError::InvalidStatus { value } => {
                write!(f, "Invalid status value: '{}'", value)
            }
            ValidationError::InvalidPattern { value } => {
                write!(f, "Invalid recurrence pattern: '{}'", value)
            }
        }
    }
}

impl std::error::Error for SchedulerError {}
impl std::error::Error for ValidationError {}
