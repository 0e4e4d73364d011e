// ABOUTME: Database operations for body-measurement evaluations
// ABOUTME: Append-only assessment history with server-side BMI computation
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::errors::{AppError, AppResult};
use crate::models::Evaluation;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Request to record a new evaluation
#[derive(Debug, Clone, Default)]
pub struct NewEvaluation {
    /// Weight in kilograms
    pub weight: Option<f64>,
    /// Height in centimeters
    pub height: Option<f64>,
    /// Body fat percentage
    pub body_fat_percentage: Option<f64>,
    /// Chest circumference in centimeters
    pub chest_circumference: Option<f64>,
    /// Waist circumference in centimeters
    pub waist_circumference: Option<f64>,
    /// Hip circumference in centimeters
    pub hip_circumference: Option<f64>,
    /// Arm circumference in centimeters
    pub arm_circumference: Option<f64>,
    /// Leg circumference in centimeters
    pub leg_circumference: Option<f64>,
    /// Blood pressure reading
    pub blood_pressure: Option<String>,
    /// Resting heart rate
    pub heart_rate: Option<i64>,
    /// Assessor notes
    pub notes: Option<String>,
}

/// Compute body mass index from weight (kg) and height (cm).
///
/// Returns `None` unless both inputs are present and positive.
#[must_use]
pub fn compute_bmi(weight_kg: Option<f64>, height_cm: Option<f64>) -> Option<f64> {
    let weight = weight_kg.filter(|w| *w > 0.0)?;
    let height_m = height_cm.filter(|h| *h > 0.0)? / 100.0;
    Some((weight / (height_m * height_m) * 10.0).round() / 10.0)
}

/// Evaluation database operations manager
pub struct EvaluationsManager {
    pool: SqlitePool,
}

impl EvaluationsManager {
    /// Create a new evaluations manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a new evaluation; BMI is computed from weight and height
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(&self, user_id: Uuid, new: &NewEvaluation) -> AppResult<Evaluation> {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let bmi = compute_bmi(new.weight, new.height);

        sqlx::query(
            r"
            INSERT INTO evaluations (
                id, user_id, weight, height, bmi, body_fat_percentage,
                chest_circumference, waist_circumference, hip_circumference,
                arm_circumference, leg_circumference, blood_pressure,
                heart_rate, notes, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ",
        )
        .bind(id.to_string())
        .bind(user_id.to_string())
        .bind(new.weight)
        .bind(new.height)
        .bind(bmi)
        .bind(new.body_fat_percentage)
        .bind(new.chest_circumference)
        .bind(new.waist_circumference)
        .bind(new.hip_circumference)
        .bind(new.arm_circumference)
        .bind(new.leg_circumference)
        .bind(&new.blood_pressure)
        .bind(new.heart_rate)
        .bind(&new.notes)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create evaluation: {e}")))?;

        Ok(Evaluation {
            id,
            user_id,
            weight: new.weight,
            height: new.height,
            bmi,
            body_fat_percentage: new.body_fat_percentage,
            chest_circumference: new.chest_circumference,
            waist_circumference: new.waist_circumference,
            hip_circumference: new.hip_circumference,
            arm_circumference: new.arm_circumference,
            leg_circumference: new.leg_circumference,
            blood_pressure: new.blood_pressure.clone(),
            heart_rate: new.heart_rate,
            notes: new.notes.clone(),
            created_at: now,
        })
    }

    /// Get the most recent evaluation for a student
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn latest(&self, user_id: Uuid) -> AppResult<Option<Evaluation>> {
        let row = sqlx::query(
            "SELECT * FROM evaluations WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get latest evaluation: {e}")))?;

        row.map(|r| row_to_evaluation(&r)).transpose()
    }

    /// List all evaluations for a student, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<Evaluation>> {
        let rows = sqlx::query(
            "SELECT * FROM evaluations WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list evaluations: {e}")))?;

        rows.iter().map(row_to_evaluation).collect()
    }
}

/// Map a database row onto an [`Evaluation`]
fn row_to_evaluation(row: &SqliteRow) -> AppResult<Evaluation> {
    let id_str: String = row.get("id");
    let user_id_str: String = row.get("user_id");
    let created_at_str: String = row.get("created_at");

    Ok(Evaluation {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| AppError::database(format!("Corrupt evaluation id: {e}")))?,
        user_id: Uuid::parse_str(&user_id_str)
            .map_err(|e| AppError::database(format!("Corrupt evaluation user id: {e}")))?,
        weight: row.get("weight"),
        height: row.get("height"),
        bmi: row.get("bmi"),
        body_fat_percentage: row.get("body_fat_percentage"),
        chest_circumference: row.get("chest_circumference"),
        waist_circumference: row.get("waist_circumference"),
        hip_circumference: row.get("hip_circumference"),
        arm_circumference: row.get("arm_circumference"),
        leg_circumference: row.get("leg_circumference"),
        blood_pressure: row.get("blood_pressure"),
        heart_rate: row.get("heart_rate"),
        notes: row.get("notes"),
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}
