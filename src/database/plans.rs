// ABOUTME: Database operations for workout and nutrition plans
// ABOUTME: Handles plan creation, coach review transitions, and pending queues
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::errors::{AppError, AppResult};
use crate::models::{Plan, PlanReviewStatus, PlanType};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// A pending plan joined with its owner's display name (coach review queue)
#[derive(Debug, Clone, serde::Serialize)]
pub struct PendingPlan {
    /// The plan awaiting review
    #[serde(flatten)]
    pub plan: Plan,
    /// Student display name
    pub student_name: Option<String>,
    /// Student email
    pub student_email: String,
}

/// Plan database operations manager
pub struct PlansManager {
    pool: SqlitePool,
}

impl PlansManager {
    /// Create a new plans manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a plan in `pending` status
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(
        &self,
        user_id: Uuid,
        plan_type: PlanType,
        content: &serde_json::Value,
    ) -> AppResult<Plan> {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let content_json = serde_json::to_string(content)?;

        sqlx::query(
            r"
            INSERT INTO plans (id, user_id, type, content, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .bind(plan_type.as_str())
        .bind(&content_json)
        .bind(PlanReviewStatus::Pending.as_str())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create plan: {e}")))?;

        Ok(Plan {
            id,
            user_id,
            plan_type,
            content: content.clone(),
            status: PlanReviewStatus::Pending,
            approved_by: None,
            approved_at: None,
            notes: None,
            created_at: now,
        })
    }

    /// Get a plan by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get(&self, id: Uuid) -> AppResult<Option<Plan>> {
        let row = sqlx::query("SELECT * FROM plans WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get plan: {e}")))?;

        row.map(|r| row_to_plan(&r)).transpose()
    }

    /// List all plans for a student, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Plan>> {
        let rows = sqlx::query(
            "SELECT * FROM plans WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list plans: {e}")))?;

        rows.iter().map(row_to_plan).collect()
    }

    /// List all pending plans with student identity (coach review queue)
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_pending(&self) -> AppResult<Vec<PendingPlan>> {
        let rows = sqlx::query(
            r"
            SELECT p.*, pr.full_name AS student_name, pr.email AS student_email
            FROM plans p
            JOIN profiles pr ON pr.id = p.user_id
            WHERE p.status = 'pending'
            ORDER BY p.created_at ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list pending plans: {e}")))?;

        rows.iter()
            .map(|r| {
                Ok(PendingPlan {
                    plan: row_to_plan(r)?,
                    student_name: r.get("student_name"),
                    student_email: r.get("student_email"),
                })
            })
            .collect()
    }

    /// Mark a plan approved
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn approve(&self, id: Uuid, coach_id: Uuid) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE plans SET status = $2, approved_by = $3, approved_at = $4
            WHERE id = $1
            ",
        )
        .bind(id.to_string())
        .bind(PlanReviewStatus::Approved.as_str())
        .bind(coach_id.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to approve plan: {e}")))?;

        Ok(())
    }

    /// Replace the plan content and mark it approved (edit implies approval)
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn approve_with_content(
        &self,
        id: Uuid,
        coach_id: Uuid,
        content: &serde_json::Value,
    ) -> AppResult<()> {
        let content_json = serde_json::to_string(content)?;

        sqlx::query(
            r"
            UPDATE plans SET content = $2, status = $3, approved_by = $4, approved_at = $5
            WHERE id = $1
            ",
        )
        .bind(id.to_string())
        .bind(&content_json)
        .bind(PlanReviewStatus::Approved.as_str())
        .bind(coach_id.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to edit plan: {e}")))?;

        Ok(())
    }

    /// Mark a plan rejected with the reason stored in notes
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn reject(&self, id: Uuid, coach_id: Uuid, reason: &str) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE plans SET status = $2, approved_by = $3, approved_at = $4, notes = $5
            WHERE id = $1
            ",
        )
        .bind(id.to_string())
        .bind(PlanReviewStatus::Rejected.as_str())
        .bind(coach_id.to_string())
        .bind(Utc::now().to_rfc3339())
        .bind(reason)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to reject plan: {e}")))?;

        Ok(())
    }
}

/// Map a database row onto a [`Plan`]
fn row_to_plan(row: &SqliteRow) -> AppResult<Plan> {
    let id_str: String = row.get("id");
    let user_id_str: String = row.get("user_id");
    let type_str: String = row.get("type");
    let content_str: String = row.get("content");
    let status_str: String = row.get("status");
    let approved_by_str: Option<String> = row.get("approved_by");
    let approved_at_str: Option<String> = row.get("approved_at");
    let created_at_str: String = row.get("created_at");

    Ok(Plan {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| AppError::database(format!("Corrupt plan id: {e}")))?,
        user_id: Uuid::parse_str(&user_id_str)
            .map_err(|e| AppError::database(format!("Corrupt plan user id: {e}")))?,
        plan_type: PlanType::parse(&type_str)
            .ok_or_else(|| AppError::database(format!("Unknown plan type: {type_str}")))?,
        content: serde_json::from_str(&content_str)?,
        status: PlanReviewStatus::parse(&status_str),
        approved_by: approved_by_str.as_deref().and_then(|s| Uuid::parse_str(s).ok()),
        approved_at: approved_at_str
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc)),
        notes: row.get("notes"),
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}
