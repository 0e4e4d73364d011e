// ABOUTME: Database operations for the exercise library
// ABOUTME: Exercises carry a media path that is resolved to a signed URL at read time
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::errors::{AppError, AppResult};
use crate::models::Exercise;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Request to add an exercise to the library
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct NewExercise {
    /// Display name
    pub name: String,
    /// Category (strength, cardio, mobility, ...)
    pub category: Option<String>,
    /// Difficulty level
    pub level: Option<String>,
    /// Description and cues
    pub description: Option<String>,
    /// Targeted muscle groups
    #[serde(default)]
    pub muscle_groups: Vec<String>,
    /// Required equipment
    #[serde(default)]
    pub equipment: Vec<String>,
    /// Storage path of the demo video
    pub video_path: Option<String>,
    /// External video URL
    pub video_url: Option<String>,
    /// Thumbnail storage path
    pub thumbnail_path: Option<String>,
}

/// Exercise library database operations manager
pub struct ExercisesManager {
    pool: SqlitePool,
}

impl ExercisesManager {
    /// Create a new exercises manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Add an exercise to the library
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(&self, new: &NewExercise, created_by: Option<Uuid>) -> AppResult<Exercise> {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let muscle_groups_json = serde_json::to_string(&new.muscle_groups)?;
        let equipment_json = serde_json::to_string(&new.equipment)?;

        sqlx::query(
            r"
            INSERT INTO exercises (
                id, name, category, level, description, muscle_groups,
                equipment, video_path, video_url, thumbnail_path, created_by, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ",
        )
        .bind(id.to_string())
        .bind(&new.name)
        .bind(&new.category)
        .bind(&new.level)
        .bind(&new.description)
        .bind(&muscle_groups_json)
        .bind(&equipment_json)
        .bind(&new.video_path)
        .bind(&new.video_url)
        .bind(&new.thumbnail_path)
        .bind(created_by.map(|c| c.to_string()))
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create exercise: {e}")))?;

        Ok(Exercise {
            id,
            name: new.name.clone(),
            category: new.category.clone(),
            level: new.level.clone(),
            description: new.description.clone(),
            muscle_groups: new.muscle_groups.clone(),
            equipment: new.equipment.clone(),
            video_path: new.video_path.clone(),
            video_url: new.video_url.clone(),
            thumbnail_path: new.thumbnail_path.clone(),
            created_by,
            created_at: now,
        })
    }

    /// Get an exercise by id
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get(&self, id: Uuid) -> AppResult<Option<Exercise>> {
        let row = sqlx::query("SELECT * FROM exercises WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get exercise: {e}")))?;

        row.map(|r| row_to_exercise(&r)).transpose()
    }

    /// List the whole library, alphabetically
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list(&self) -> AppResult<Vec<Exercise>> {
        let rows = sqlx::query("SELECT * FROM exercises ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list exercises: {e}")))?;

        rows.iter().map(row_to_exercise).collect()
    }
}

/// Map a database row onto an [`Exercise`]
fn row_to_exercise(row: &SqliteRow) -> AppResult<Exercise> {
    let id_str: String = row.get("id");
    let muscle_groups_str: Option<String> = row.get("muscle_groups");
    let equipment_str: Option<String> = row.get("equipment");
    let created_by_str: Option<String> = row.get("created_by");
    let created_at_str: String = row.get("created_at");

    Ok(Exercise {
        id: Uuid::parse_str(&id_str)
            .map_err(|e| AppError::database(format!("Corrupt exercise id: {e}")))?,
        name: row.get("name"),
        category: row.get("category"),
        level: row.get("level"),
        description: row.get("description"),
        muscle_groups: muscle_groups_str
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default(),
        equipment: equipment_str
            .as_deref()
            .and_then(|s| serde_json::from_str(s).ok())
            .unwrap_or_default(),
        video_path: row.get("video_path"),
        video_url: row.get("video_url"),
        thumbnail_path: row.get("thumbnail_path"),
        created_by: created_by_str.as_deref().and_then(|s| Uuid::parse_str(s).ok()),
        created_at: DateTime::parse_from_rfc3339(&created_at_str)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    })
}
