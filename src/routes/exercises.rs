// ABOUTME: Route handlers for the exercise library and signed video URLs
// ABOUTME: Video links are HMAC-signed and expire, never raw storage paths
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::database::exercises::NewExercise;
use crate::errors::AppError;
use crate::resources::ServerResources;
use crate::routes::bearer_auth;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Response carrying a time-limited video URL
#[derive(Debug, Serialize)]
pub struct ExerciseVideoResponse {
    /// Exercise id
    pub exercise_id: Uuid,
    /// Signed URL, valid until `expires_at`
    pub url: String,
    /// Unix timestamp the URL stops working
    pub expires_at: i64,
}

/// Exercise library routes handler
pub struct ExerciseRoutes;

impl ExerciseRoutes {
    /// Create all exercise routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/exercises", get(Self::handle_list))
            .route("/api/exercises", post(Self::handle_create))
            .route("/api/exercises/:id/video", get(Self::handle_video_url))
            .with_state(resources)
    }

    /// Handle GET /api/exercises - The whole library
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        bearer_auth(&headers, &resources)?;
        let exercises = resources.database.exercises().list().await?;

        Ok((StatusCode::OK, Json(exercises)).into_response())
    }

    /// Handle POST /api/exercises - Add a library entry (staff only)
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<NewExercise>,
    ) -> Result<Response, AppError> {
        let auth = bearer_auth(&headers, &resources)?;
        auth.require_staff()?;

        if body.name.trim().is_empty() {
            return Err(AppError::missing_field("name"));
        }

        let exercise = resources
            .database
            .exercises()
            .create(&body, Some(auth.user_id))
            .await?;

        Ok((StatusCode::CREATED, Json(exercise)).into_response())
    }

    /// Handle GET /api/exercises/:id/video - Signed demo video URL
    async fn handle_video_url(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        bearer_auth(&headers, &resources)?;

        let exercise = resources
            .database
            .exercises()
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Exercise {id}")))?;

        let video_path = exercise
            .video_path
            .ok_or_else(|| AppError::not_found(format!("Video for exercise {id}")))?;

        let now = Utc::now().timestamp();
        let url = resources.media.sign(&video_path, now)?;

        Ok((
            StatusCode::OK,
            Json(ExerciseVideoResponse {
                exercise_id: id,
                url,
                expires_at: now + resources.config.media.url_expiry_secs,
            }),
        )
            .into_response())
    }
}
