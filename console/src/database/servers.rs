//! Server CRUD and status counters.

use anyhow::{anyhow, Result};
use chrono::Utc;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use super::records::{NewServer, ServerRecord, ServerStatus};
use super::Database;

/// Server totals broken down by status, for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCounts {
    pub total: i64,
    pub online: i64,
    pub maintenance: i64,
    pub offline: i64,
}

impl Database {
    pub async fn create_server(&self, server: &NewServer) -> Result<ServerRecord> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO servers (name, hostname, ip_address, status, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&server.name)
        .bind(&server.hostname)
        .bind(&server.ip_address)
        .bind(ServerStatus::Online.as_str())
        .bind(&server.description)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!("Created server {} ({})", server.name, id);

        self.get_server(id)
            .await?
            .ok_or_else(|| anyhow!("Server {} missing immediately after insert", id))
    }

    pub async fn get_server(&self, id: i64) -> Result<Option<ServerRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, hostname, ip_address, status, description, created_at, updated_at
            FROM servers
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| Self::row_to_server(&row)).transpose()
    }

    pub async fn get_server_by_name(&self, name: &str) -> Result<Option<ServerRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, hostname, ip_address, status, description, created_at, updated_at
            FROM servers
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| Self::row_to_server(&row)).transpose()
    }

    pub async fn list_servers(&self) -> Result<Vec<ServerRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, hostname, ip_address, status, description, created_at, updated_at
            FROM servers
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_server).collect()
    }

    /// Persist an edited server row. All mutable fields are written;
    /// updated_at is stamped here.
    pub async fn update_server(&self, server: &ServerRecord) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE servers
            SET name = ?, hostname = ?, ip_address = ?, status = ?, description = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&server.name)
        .bind(&server.hostname)
        .bind(&server.ip_address)
        .bind(server.status.as_str())
        .bind(&server.description)
        .bind(Utc::now())
        .bind(server.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete a server and all of its maintenance schedules in one
    /// transaction. Callers must cancel the schedules' timers first.
    pub async fn delete_server(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM maintenance_schedules WHERE server_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM servers WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn server_counts(&self) -> Result<ServerCounts> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS count FROM servers GROUP BY status")
            .fetch_all(&self.pool)
            .await?;

        let mut counts = ServerCounts {
            total: 0,
            online: 0,
            maintenance: 0,
            offline: 0,
        };

        for row in rows {
            let status: String = row.try_get("status")?;
            let count: i64 = row.try_get("count")?;
            counts.total += count;
            match status.parse::<ServerStatus>()? {
                ServerStatus::Online => counts.online = count,
                ServerStatus::Maintenance => counts.maintenance = count,
                ServerStatus::Offline => counts.offline = count,
            }
        }

        Ok(counts)
    }

    fn row_to_server(row: &SqliteRow) -> Result<ServerRecord> {
        let status: String = row.try_get("status")?;
        Ok(ServerRecord {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            hostname: row.try_get("hostname")?,
            ip_address: row.try_get("ip_address")?,
            status: status.parse()?,
            description: row.try_get("description")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
