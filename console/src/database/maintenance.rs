//! Maintenance schedule CRUD and phase-transition writes.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use super::records::{
    MaintenanceRecord, MaintenanceStatus, MaintenanceWithServer, NewMaintenance, ServerStatus,
};
use super::Database;

/// Maintenance totals for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceCounts {
    pub scheduled: i64,
    pub in_progress: i64,
    pub upcoming_24h: i64,
}

impl Database {
    pub async fn create_maintenance(
        &self,
        maintenance: &NewMaintenance,
    ) -> Result<MaintenanceRecord> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO maintenance_schedules (
                server_id, title, description, scheduled_start, scheduled_end,
                status, recurring, recurring_pattern, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(maintenance.server_id)
        .bind(&maintenance.title)
        .bind(&maintenance.description)
        .bind(maintenance.scheduled_start)
        .bind(maintenance.scheduled_end)
        .bind(MaintenanceStatus::Scheduled.as_str())
        .bind(maintenance.recurring)
        .bind(maintenance.recurring_pattern.map(|p| p.as_str()))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(
            "Created maintenance schedule {} for server {}",
            id, maintenance.server_id
        );

        self.get_maintenance(id)
            .await?
            .ok_or_else(|| anyhow!("Maintenance {} missing immediately after insert", id))
    }

    pub async fn get_maintenance(&self, id: i64) -> Result<Option<MaintenanceRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, server_id, title, description, scheduled_start, scheduled_end,
                   actual_start, actual_end, status, recurring, recurring_pattern,
                   created_at, updated_at
            FROM maintenance_schedules
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| Self::row_to_maintenance(&row)).transpose()
    }

    pub async fn get_maintenance_with_server(
        &self,
        id: i64,
    ) -> Result<Option<MaintenanceWithServer>> {
        let row = sqlx::query(
            r#"
            SELECT m.id, m.server_id, m.title, m.description, m.scheduled_start,
                   m.scheduled_end, m.actual_start, m.actual_end, m.status, m.recurring,
                   m.recurring_pattern, m.created_at, m.updated_at,
                   s.name AS server_name
            FROM maintenance_schedules m
            JOIN servers s ON s.id = m.server_id
            WHERE m.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(MaintenanceWithServer {
                record: Self::row_to_maintenance(&row)?,
                server_name: row.try_get("server_name")?,
            })
        })
        .transpose()
    }

    pub async fn list_maintenance(&self) -> Result<Vec<MaintenanceWithServer>> {
        let rows = sqlx::query(
            r#"
            SELECT m.id, m.server_id, m.title, m.description, m.scheduled_start,
                   m.scheduled_end, m.actual_start, m.actual_end, m.status, m.recurring,
                   m.recurring_pattern, m.created_at, m.updated_at,
                   s.name AS server_name
            FROM maintenance_schedules m
            JOIN servers s ON s.id = m.server_id
            ORDER BY m.scheduled_start DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(MaintenanceWithServer {
                    record: Self::row_to_maintenance(row)?,
                    server_name: row.try_get("server_name")?,
                })
            })
            .collect()
    }

    pub async fn list_maintenance_for_server(
        &self,
        server_id: i64,
    ) -> Result<Vec<MaintenanceRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, server_id, title, description, scheduled_start, scheduled_end,
                   actual_start, actual_end, status, recurring, recurring_pattern,
                   created_at, updated_at
            FROM maintenance_schedules
            WHERE server_id = ?
            ORDER BY scheduled_start DESC
            "#,
        )
        .bind(server_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_maintenance).collect()
    }

    pub async fn list_maintenance_by_status(
        &self,
        status: MaintenanceStatus,
    ) -> Result<Vec<MaintenanceRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, server_id, title, description, scheduled_start, scheduled_end,
                   actual_start, actual_end, status, recurring, recurring_pattern,
                   created_at, updated_at
            FROM maintenance_schedules
            WHERE status = ?
            ORDER BY scheduled_start
            "#,
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_maintenance).collect()
    }

    /// Persist an edited maintenance row. All mutable fields are written;
    /// updated_at is stamped here.
    pub async fn update_maintenance(&self, maintenance: &MaintenanceRecord) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE maintenance_schedules
            SET title = ?, description = ?, scheduled_start = ?, scheduled_end = ?,
                actual_start = ?, actual_end = ?, status = ?, recurring = ?,
                recurring_pattern = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&maintenance.title)
        .bind(&maintenance.description)
        .bind(maintenance.scheduled_start)
        .bind(maintenance.scheduled_end)
        .bind(maintenance.actual_start)
        .bind(maintenance.actual_end)
        .bind(maintenance.status.as_str())
        .bind(maintenance.recurring)
        .bind(maintenance.recurring_pattern.map(|p| p.as_str()))
        .bind(Utc::now())
        .bind(maintenance.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete_maintenance(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM maintenance_schedules WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Flip a SCHEDULED or IN_PROGRESS row to CANCELLED. Returns false when
    /// the row is absent or already terminal; nothing is written in that case.
    pub async fn mark_maintenance_cancelled(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE maintenance_schedules
            SET status = ?, updated_at = ?
            WHERE id = ? AND status IN (?, ?)
            "#,
        )
        .bind(MaintenanceStatus::Cancelled.as_str())
        .bind(Utc::now())
        .bind(id)
        .bind(MaintenanceStatus::Scheduled.as_str())
        .bind(MaintenanceStatus::InProgress.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Start-fire write: server goes MAINTENANCE, record goes IN_PROGRESS
    /// with actual_start stamped. Both rows update in one transaction.
    pub async fn apply_start_transition(
        &self,
        maintenance_id: i64,
        server_id: i64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE servers SET status = ?, updated_at = ? WHERE id = ?")
            .bind(ServerStatus::Maintenance.as_str())
            .bind(now)
            .bind(server_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE maintenance_schedules
            SET status = ?, actual_start = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(MaintenanceStatus::InProgress.as_str())
        .bind(now)
        .bind(now)
        .bind(maintenance_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// End-fire write: server back to ONLINE, record COMPLETED with
    /// actual_end stamped. Both rows update in one transaction.
    pub async fn apply_end_transition(
        &self,
        maintenance_id: i64,
        server_id: i64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE servers SET status = ?, updated_at = ? WHERE id = ?")
            .bind(ServerStatus::Online.as_str())
            .bind(now)
            .bind(server_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE maintenance_schedules
            SET status = ?, actual_end = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(MaintenanceStatus::Completed.as_str())
        .bind(now)
        .bind(now)
        .bind(maintenance_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn maintenance_counts(
        &self,
        upcoming_window_hours: i64,
    ) -> Result<MaintenanceCounts> {
        let scheduled: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM maintenance_schedules WHERE status = ?")
                .bind(MaintenanceStatus::Scheduled.as_str())
                .fetch_one(&self.pool)
                .await?;

        let in_progress: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM maintenance_schedules WHERE status = ?")
                .bind(MaintenanceStatus::InProgress.as_str())
                .fetch_one(&self.pool)
                .await?;

        let now = Utc::now();
        let horizon = now + Duration::hours(upcoming_window_hours);
        let upcoming_24h: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM maintenance_schedules
            WHERE status = ? AND scheduled_start > ? AND scheduled_start <= ?
            "#,
        )
        .bind(MaintenanceStatus::Scheduled.as_str())
        .bind(now)
        .bind(horizon)
        .fetch_one(&self.pool)
        .await?;

        Ok(MaintenanceCounts {
            scheduled,
            in_progress,
            upcoming_24h,
        })
    }

    fn row_to_maintenance(row: &SqliteRow) -> Result<MaintenanceRecord> {
        let status: String = row.try_get("status")?;
        let recurring_pattern: Option<String> = row.try_get("recurring_pattern")?;
        Ok(MaintenanceRecord {
            id: row.try_get("id")?,
            server_id: row.try_get("server_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            scheduled_start: row.try_get("scheduled_start")?,
            scheduled_end: row.try_get("scheduled_end")?,
            actual_start: row.try_get("actual_start")?,
            actual_end: row.try_get("actual_end")?,
            status: status.parse()?,
            recurring: row.try_get("recurring")?,
            recurring_pattern: recurring_pattern.map(|p| p.parse()).transpose()?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
