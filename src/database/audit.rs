// ABOUTME: Database operations for the administrative audit log
// ABOUTME: Audit rows are written before destructive admin actions take effect
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::errors::{AppError, AppResult};
use crate::models::AuditLogEntry;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Audit log database operations manager
pub struct AuditManager {
    pool: SqlitePool,
}

impl AuditManager {
    /// Create a new audit manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record an administrative action
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn record(
        &self,
        action: &str,
        actor_id: Option<Uuid>,
        target_user_id: Option<Uuid>,
        reason: Option<&str>,
        metadata: serde_json::Value,
    ) -> AppResult<AuditLogEntry> {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let metadata_json = serde_json::to_string(&metadata)?;

        sqlx::query(
            r"
            INSERT INTO audit_log (id, action, actor_id, target_user_id, reason, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(id.to_string())
        .bind(action)
        .bind(actor_id.map(|a| a.to_string()))
        .bind(target_user_id.map(|t| t.to_string()))
        .bind(reason)
        .bind(&metadata_json)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to record audit entry: {e}")))?;

        Ok(AuditLogEntry {
            id,
            action: action.to_string(),
            actor_id,
            target_user_id,
            reason: reason.map(ToString::to_string),
            metadata,
            created_at: now,
        })
    }

    /// List audit entries for a target user, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_target(&self, target_user_id: Uuid) -> AppResult<Vec<AuditLogEntry>> {
        let rows = sqlx::query(
            "SELECT * FROM audit_log WHERE target_user_id = $1 ORDER BY created_at DESC",
        )
        .bind(target_user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list audit entries: {e}")))?;

        rows.iter().map(row_to_audit_entry).collect()
    }
}

/// Map a database row onto an [`AuditLogEntry`]
fn row_to_audit_entry(row: &SqliteRow) -> AppResult<AuditLogEntry> {
    let id_str: String = row.get("id");
    let actor_str: Option<String> = row.get("actor_id");
    let target_str: Option<String> = row.get("target_user_id");
    let metadata_str: String = row.get("metadata");
    let created_at_str: String = row.get("created_at");

    Ok(AuditLogEntry {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| AppError::database(format!("Corrupt audit id: {e}")))?,
        action: row.get("action"),
        actor_id: actor_str.as_deref().and_then(|s| Uuid::parse_str(s).ok()),
        target_user_id: target_str.as_deref().and_then(|s| Uuid::parse_str(s).ok()),
        reason: row.get("reason"),
        metadata: serde_json::from_str(&metadata_str).unwrap_or(serde_json::Value::Null),
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}
