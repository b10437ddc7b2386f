//! Database record types (entities).
//!
//! Status and pattern fields are closed enums in code, serialized to a fixed
//! lowercase string set at both the storage and JSON boundaries.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Online,
    Maintenance,
    Offline,
}

impl ServerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerStatus::Online => "online",
            ServerStatus::Maintenance => "maintenance",
            ServerStatus::Offline => "offline",
        }
    }
}

impl FromStr for ServerStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(ServerStatus::Online),
            "maintenance" => Ok(ServerStatus::Maintenance),
            "offline" => Ok(ServerStatus::Offline),
            other => Err(ValidationError::InvalidStatus {
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl MaintenanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceStatus::Scheduled => "scheduled",
            MaintenanceStatus::InProgress => "in_progress",
            MaintenanceStatus::Completed => "completed",
            MaintenanceStatus::Cancelled => "cancelled",
        }
    }

    /// COMPLETED and CANCELLED are terminal; nothing transitions out of them.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MaintenanceStatus::Completed | MaintenanceStatus::Cancelled
        )
    }
}

impl FromStr for MaintenanceStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(MaintenanceStatus::Scheduled),
            "in_progress" => Ok(MaintenanceStatus::InProgress),
            "completed" => Ok(MaintenanceStatus::Completed),
            "cancelled" => Ok(MaintenanceStatus::Cancelled),
            other => Err(ValidationError::InvalidStatus {
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
}

impl RecurrencePattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrencePattern::Daily => "daily",
            RecurrencePattern::Weekly => "weekly",
            RecurrencePattern::Monthly => "monthly",
        }
    }

    /// Fixed offset to the next occurrence. Monthly is a flat 30 days, not
    /// calendar-month-aware.
    pub fn offset(&self) -> Duration {
        match self {
            RecurrencePattern::Daily => Duration::days(1),
            RecurrencePattern::Weekly => Duration::days(7),
            RecurrencePattern::Monthly => Duration::days(30),
        }
    }
}

impl FromStr for RecurrencePattern {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(RecurrencePattern::Daily),
            "weekly" => Ok(RecurrencePattern::Weekly),
            "monthly" => Ok(RecurrencePattern::Monthly),
            other => Err(ValidationError::InvalidPattern {
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerRecord {
    pub id: i64,
    pub name: String,
    pub hostname: String,
    pub ip_address: String,
    pub status: ServerStatus,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    pub id: i64,
    pub server_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub status: MaintenanceStatus,
    pub recurring: bool,
    pub recurring_pattern: Option<RecurrencePattern>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Maintenance row joined with the owning server's name, for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceWithServer {
    #[serde(flatten)]
    pub record: MaintenanceRecord,
    pub server_name: String,
}

/// Insert payload for a new server. Status always starts out online.
#[derive(Debug, Clone)]
pub struct NewServer {
    pub name: String,
    pub hostname: String,
    pub ip_address: String,
    pub description: Option<String>,
}

/// Insert payload for a new maintenance schedule (created SCHEDULED).
#[derive(Debug, Clone)]
pub struct NewMaintenance {
    pub server_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub recurring: bool,
    pub recurring_pattern: Option<RecurrencePattern>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(ServerStatus::Online, "online")]
    #[test_case(ServerStatus::Maintenance, "maintenance")]
    #[test_case(ServerStatus::Offline, "offline")]
    fn server_status_round_trips(status: ServerStatus, s: &str) {
        assert_eq!(status.as_str(), s);
        assert_eq!(s.parse::<ServerStatus>().unwrap(), status);
    }

    #[test_case(MaintenanceStatus::Scheduled, "scheduled")]
    #[test_case(MaintenanceStatus::InProgress, "in_progress")]
    #[test_case(MaintenanceStatus::Completed, "completed")]
    #[test_case(MaintenanceStatus::Cancelled, "cancelled")]
    fn maintenance_status_round_trips(status: MaintenanceStatus, s: &str) {
        assert_eq!(status.as_str(), s);
        assert_eq!(s.parse::<MaintenanceStatus>().unwrap(), status);
    }

    #[test_case(RecurrencePattern::Daily, 1)]
    #[test_case(RecurrencePattern::Weekly, 7)]
    #[test_case(RecurrencePattern::Monthly, 30)]
    fn recurrence_offsets_are_fixed_day_counts(pattern: RecurrencePattern, days: i64) {
        assert_eq!(pattern.offset(), Duration::days(days));
    }

    #[test]
    fn unknown_strings_are_rejected() {
        assert!("ONLINE".parse::<ServerStatus>().is_err());
        assert!("running".parse::<MaintenanceStatus>().is_err());
        assert!("yearly".parse::<RecurrencePattern>().is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(MaintenanceStatus::Completed.is_terminal());
        assert!(MaintenanceStatus::Cancelled.is_terminal());
        assert!(!MaintenanceStatus::Scheduled.is_terminal());
        assert!(!MaintenanceStatus::InProgress.is_terminal());
    }
}
