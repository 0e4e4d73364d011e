// ABOUTME: Database operations for raw billing webhook event records
// ABOUTME: Every verified event is stored before dispatch for later inspection
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// A stored webhook event
#[derive(Debug, Clone, serde::Serialize)]
pub struct WebhookEvent {
    /// Row id
    pub id: Uuid,
    /// Gateway event type, e.g. `checkout.session.completed`
    pub event_type: String,
    /// Full event payload as received
    pub event_data: serde_json::Value,
    /// When the event was stored
    pub created_at: DateTime<Utc>,
}

/// Webhook event database operations manager
pub struct WebhookEventsManager {
    pool: SqlitePool,
}

impl WebhookEventsManager {
    /// Create a new webhook events manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a verified event payload
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn record(
        &self,
        event_type: &str,
        event_data: &serde_json::Value,
    ) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        let payload = serde_json::to_string(event_data)?;

        sqlx::query(
            r"
            INSERT INTO webhook_events (id, event_type, event_data, created_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(id.to_string())
        .bind(event_type)
        .bind(&payload)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to record webhook event: {e}")))?;

        Ok(id)
    }

    /// List the most recently stored events
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn recent(&self, limit: i64) -> AppResult<Vec<WebhookEvent>> {
        let rows = sqlx::query(
            "SELECT * FROM webhook_events ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list webhook events: {e}")))?;

        rows.iter().map(row_to_webhook_event).collect()
    }
}

/// Map a database row onto a [`WebhookEvent`]
fn row_to_webhook_event(row: &SqliteRow) -> AppResult<WebhookEvent> {
    let id_str: String = row.get("id");
    let data_str: String = row.get("event_data");
    let created_at_str: String = row.get("created_at");

    Ok(WebhookEvent {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| AppError::database(format!("Corrupt webhook event id: {e}")))?,
        event_type: row.get("event_type"),
        event_data: serde_json::from_str(&data_str)?,
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}
