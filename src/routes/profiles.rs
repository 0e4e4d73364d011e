// ABOUTME: Route handlers for profile, intake questionnaire, and evaluations
// ABOUTME: Students read and update their own data; evaluations are append-only
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::database::evaluations::NewEvaluation;
use crate::errors::AppError;
use crate::models::Anamnese;
use crate::resources::ServerResources;
use crate::routes::bearer_auth;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Profile update request body
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    /// New display name
    pub full_name: Option<String>,
    /// New contact phone
    pub phone: Option<String>,
    /// New profile photo URL
    pub avatar_url: Option<String>,
}

/// Anamnese upsert body; `user_id` always comes from the token
#[derive(Debug, Deserialize, Default)]
pub struct AnamneseBody {
    /// Main training goal
    pub main_goal: Option<String>,
    /// Self-reported activity level
    pub activity_level: Option<String>,
    /// Birth date
    pub birth_date: Option<chrono::NaiveDate>,
    /// Gender
    pub gender: Option<String>,
    /// Height in centimeters
    pub height: Option<f64>,
    /// Current weight in kilograms
    pub current_weight: Option<f64>,
    /// Target weight in kilograms
    pub target_weight: Option<f64>,
    /// Injury description, if any
    pub injuries: Option<String>,
    /// Diabetes flag
    #[serde(default)]
    pub diabetes: bool,
    /// Hypertension flag
    #[serde(default)]
    pub hypertension: bool,
    /// Cardiovascular condition flag
    #[serde(default)]
    pub cardiovascular: bool,
    /// Dietary preference
    pub diet_preference: Option<String>,
    /// Food intolerances
    pub intolerances: Option<String>,
    /// Allergies
    pub allergies: Option<String>,
    /// Meals per day preference
    pub meals_per_day: Option<String>,
    /// Average sleep hours
    pub sleep_hours: Option<f64>,
    /// Current supplements
    pub supplements: Option<String>,
    /// Preferred training session duration
    pub training_duration: Option<String>,
    /// Weekly availability
    pub availability: Option<String>,
}

/// Evaluation creation body
#[derive(Debug, Deserialize, Default)]
pub struct CreateEvaluationRequest {
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

/// Profile, anamnese, and evaluation routes handler
pub struct ProfileRoutes;

impl ProfileRoutes {
    /// Create all profile routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/profile", get(Self::handle_get_profile))
            .route("/api/profile", put(Self::handle_update_profile))
            .route("/api/anamnese", get(Self::handle_get_anamnese))
            .route("/api/anamnese", put(Self::handle_upsert_anamnese))
            .route("/api/evaluations", get(Self::handle_list_evaluations))
            .route("/api/evaluations", post(Self::handle_create_evaluation))
            .with_state(resources)
    }

    /// Handle GET /api/profile - The caller's own profile
    async fn handle_get_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = bearer_auth(&headers, &resources)?;
        let profile = resources
            .database
            .profiles()
            .get(auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Profile {}", auth.user_id)))?;

        Ok((StatusCode::OK, Json(profile)).into_response())
    }

    /// Handle PUT /api/profile - Update contact details
    async fn handle_update_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<UpdateProfileRequest>,
    ) -> Result<Response, AppError> {
        let auth = bearer_auth(&headers, &resources)?;

        resources
            .database
            .profiles()
            .update_contact(
                auth.user_id,
                body.full_name.as_deref(),
                body.phone.as_deref(),
                body.avatar_url.as_deref(),
            )
            .await?;

        let profile = resources
            .database
            .profiles()
            .get(auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Profile {}", auth.user_id)))?;

        Ok((StatusCode::OK, Json(profile)).into_response())
    }

    /// Handle GET /api/anamnese - The caller's intake questionnaire
    async fn handle_get_anamnese(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = bearer_auth(&headers, &resources)?;
        let anamnese = resources
            .database
            .anamnese()
            .get(auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Anamnese"))?;

        Ok((StatusCode::OK, Json(anamnese)).into_response())
    }

    /// Handle PUT /api/anamnese - Create or replace the questionnaire
    async fn handle_upsert_anamnese(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<AnamneseBody>,
    ) -> Result<Response, AppError> {
        let auth = bearer_auth(&headers, &resources)?;

        let anamnese = Anamnese {
            user_id: auth.user_id,
            main_goal: body.main_goal,
            activity_level: body.activity_level,
            birth_date: body.birth_date,
            gender: body.gender,
            height: body.height,
            current_weight: body.current_weight,
            target_weight: body.target_weight,
            injuries: body.injuries,
            diabetes: body.diabetes,
            hypertension: body.hypertension,
            cardiovascular: body.cardiovascular,
            diet_preference: body.diet_preference,
            intolerances: body.intolerances,
            allergies: body.allergies,
            meals_per_day: body.meals_per_day,
            sleep_hours: body.sleep_hours,
            supplements: body.supplements,
            training_duration: body.training_duration,
            availability: body.availability,
        };

        resources.database.anamnese().upsert(&anamnese).await?;
        Ok((StatusCode::OK, Json(anamnese)).into_response())
    }

    /// Handle GET /api/evaluations - The caller's evaluation history
    async fn handle_list_evaluations(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = bearer_auth(&headers, &resources)?;
        let evaluations = resources.database.evaluations().list(auth.user_id).await?;

        Ok((StatusCode::OK, Json(evaluations)).into_response())
    }

    /// Handle POST /api/evaluations - Record a new evaluation
    async fn handle_create_evaluation(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<CreateEvaluationRequest>,
    ) -> Result<Response, AppError> {
        let auth = bearer_auth(&headers, &resources)?;

        let new = NewEvaluation {
            weight: body.weight,
            height: body.height,
            body_fat_percentage: body.body_fat_percentage,
            chest_circumference: body.chest_circumference,
            waist_circumference: body.waist_circumference,
            hip_circumference: body.hip_circumference,
            arm_circumference: body.arm_circumference,
            leg_circumference: body.leg_circumference,
            blood_pressure: body.blood_pressure,
            heart_rate: body.heart_rate,
            notes: body.notes,
        };

        let evaluation = resources
            .database
            .evaluations()
            .create(auth.user_id, &new)
            .await?;

        Ok((StatusCode::CREATED, Json(evaluation)).into_response())
    }
}
