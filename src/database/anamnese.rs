// ABOUTME: Database operations for the anamnese intake questionnaire
// ABOUTME: One updatable row per student, read during plan generation
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::errors::{AppError, AppResult};
use crate::models::Anamnese;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Anamnese database operations manager
pub struct AnamneseManager {
    pool: SqlitePool,
}

impl AnamneseManager {
    /// Create a new anamnese manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or update the intake questionnaire for a student
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails.
    pub async fn upsert(&self, anamnese: &Anamnese) -> AppResult<()> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r"
            INSERT INTO anamnese (
                user_id, main_goal, activity_level, birth_date, gender, height,
                current_weight, target_weight, injuries, diabetes, hypertension,
                cardiovascular, diet_preference, intolerances, allergies,
                meals_per_day, sleep_hours, supplements, training_duration,
                availability, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                      $15, $16, $17, $18, $19, $20, $21, $21)
            ON CONFLICT(user_id) DO UPDATE SET
                main_goal = excluded.main_goal,
                activity_level = excluded.activity_level,
                birth_date = excluded.birth_date,
                gender = excluded.gender,
                height = excluded.height,
                current_weight = excluded.current_weight,
                target_weight = excluded.target_weight,
                injuries = excluded.injuries,
                diabetes = excluded.diabetes,
                hypertension = excluded.hypertension,
                cardiovascular = excluded.cardiovascular,
                diet_preference = excluded.diet_preference,
                intolerances = excluded.intolerances,
                allergies = excluded.allergies,
                meals_per_day = excluded.meals_per_day,
                sleep_hours = excluded.sleep_hours,
                supplements = excluded.supplements,
                training_duration = excluded.training_duration,
                availability = excluded.availability,
                updated_at = excluded.updated_at
            ",
        )
        .bind(anamnese.user_id.to_string())
        .bind(&anamnese.main_goal)
        .bind(&anamnese.activity_level)
        .bind(anamnese.birth_date.map(|d| d.to_string()))
        .bind(&anamnese.gender)
        .bind(anamnese.height)
        .bind(anamnese.current_weight)
        .bind(anamnese.target_weight)
        .bind(&anamnese.injuries)
        .bind(i64::from(anamnese.diabetes))
        .bind(i64::from(anamnese.hypertension))
        .bind(i64::from(anamnese.cardiovascular))
        .bind(&anamnese.diet_preference)
        .bind(&anamnese.intolerances)
        .bind(&anamnese.allergies)
        .bind(&anamnese.meals_per_day)
        .bind(anamnese.sleep_hours)
        .bind(&anamnese.supplements)
        .bind(&anamnese.training_duration)
        .bind(&anamnese.availability)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to save anamnese: {e}")))?;

        Ok(())
    }

    /// Get the questionnaire for a student
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get(&self, user_id: Uuid) -> AppResult<Option<Anamnese>> {
        let row = sqlx::query("SELECT * FROM anamnese WHERE user_id = $1")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get anamnese: {e}")))?;

        row.map(|r| row_to_anamnese(&r)).transpose()
    }

    /// Whether the student has completed the questionnaire
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn exists(&self, user_id: Uuid) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM anamnese WHERE user_id = $1")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to check anamnese: {e}")))?;

        Ok(row.is_some())
    }
}

/// Map a database row onto an [`Anamnese`]
fn row_to_anamnese(row: &SqliteRow) -> AppResult<Anamnese> {
    let user_id_str: String = row.get("user_id");
    let birth_date_str: Option<String> = row.get("birth_date");
    let diabetes: i64 = row.get("diabetes");
    let hypertension: i64 = row.get("hypertension");
    let cardiovascular: i64 = row.get("cardiovascular");

    Ok(Anamnese {
        user_id: Uuid::parse_str(&user_id_str)
            .map_err(|e| AppError::database(format!("Corrupt anamnese user id: {e}")))?,
        main_goal: row.get("main_goal"),
        activity_level: row.get("activity_level"),
        birth_date: birth_date_str.as_deref().and_then(|s| s.parse().ok()),
        gender: row.get("gender"),
        height: row.get("height"),
        current_weight: row.get("current_weight"),
        target_weight: row.get("target_weight"),
        injuries: row.get("injuries"),
        diabetes: diabetes != 0,
        hypertension: hypertension != 0,
        cardiovascular: cardiovascular != 0,
        diet_preference: row.get("diet_preference"),
        intolerances: row.get("intolerances"),
        allergies: row.get("allergies"),
        meals_per_day: row.get("meals_per_day"),
        sleep_hours: row.get("sleep_hours"),
        supplements: row.get("supplements"),
        training_duration: row.get("training_duration"),
        availability: row.get("availability"),
    })
}
