// ABOUTME: Database operations for in-app notifications
// ABOUTME: Notifications are written by billing and plan workflows and read by students
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::errors::{AppError, AppResult};
use crate::models::Notification;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Notification database operations manager
pub struct NotificationsManager {
    pool: SqlitePool,
}

impl NotificationsManager {
    /// Create a new notifications manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an unread notification for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(
        &self,
        user_id: Uuid,
        notification_type: &str,
        message: &str,
    ) -> AppResult<Notification> {
        let now = Utc::now();
        let id = Uuid::new_v4();

        sqlx::query(
            r"
            INSERT INTO notifications (id, user_id, type, message, read, created_at)
            VALUES ($1, $2, $3, $4, 0, $5)
            ",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .bind(notification_type)
        .bind(message)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create notification: {e}")))?;

        Ok(Notification {
            id,
            user_id,
            notification_type: notification_type.to_string(),
            message: message.to_string(),
            read: false,
            created_at: now,
        })
    }

    /// List notifications for a user, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list notifications: {e}")))?;

        rows.iter().map(row_to_notification).collect()
    }

    /// Mark a notification read; scoped to the owner so users cannot
    /// touch each other's rows
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails or the row does not belong
    /// to the user.
    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE notifications SET read = 1 WHERE id = $1 AND user_id = $2",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to mark notification read: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Notification {id}")));
        }
        Ok(())
    }
}

/// Map a database row onto a [`Notification`]
fn row_to_notification(row: &SqliteRow) -> AppResult<Notification> {
    let id_str: String = row.get("id");
    let user_id_str: String = row.get("user_id");
    let read: i64 = row.get("read");
    let created_at_str: String = row.get("created_at");

    Ok(Notification {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| AppError::database(format!("Corrupt notification id: {e}")))?,
        user_id: Uuid::parse_str(&user_id_str)
            .map_err(|e| AppError::database(format!("Corrupt notification user id: {e}")))?,
        notification_type: row.get("type"),
        message: row.get("message"),
        read: read != 0,
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}
