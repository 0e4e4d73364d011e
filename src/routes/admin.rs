// ABOUTME: Route handlers for administrative actions on user accounts
// ABOUTME: Account deletion is audited before it happens; coach creation is admin-only
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::database::profiles::CreateProfileRequest;
use crate::errors::AppError;
use crate::models::UserRole;
use crate::resources::ServerResources;
use crate::routes::bearer_auth;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// User deletion request body
#[derive(Debug, Deserialize)]
pub struct DeleteUserRequest {
    /// Account to delete
    pub user_id: Uuid,
    /// Why the account is being removed
    pub reason: Option<String>,
}

/// Coach account creation body
#[derive(Debug, Deserialize)]
pub struct CreateCoachRequest {
    /// Login email
    pub email: String,
    /// Initial password
    pub password: String,
    /// Display name
    pub full_name: Option<String>,
}

/// Administrative routes handler
pub struct AdminRoutes;

impl AdminRoutes {
    /// Create all admin routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/admin/users/delete", post(Self::handle_delete_user))
            .route("/api/admin/coaches", post(Self::handle_create_coach))
            .with_state(resources)
    }

    /// Handle POST /api/admin/users/delete - Audited account removal.
    ///
    /// The audit row is written first so a failed delete still leaves a
    /// trace of the attempt.
    async fn handle_delete_user(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<DeleteUserRequest>,
    ) -> Result<Response, AppError> {
        let auth = bearer_auth(&headers, &resources)?;
        auth.require_staff()?;

        let target = resources
            .database
            .profiles()
            .get(body.user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Profile {}", body.user_id)))?;

        resources
            .database
            .audit()
            .record(
                "delete_user",
                Some(auth.user_id),
                Some(target.id),
                body.reason.as_deref(),
                serde_json::json!({ "email": target.email }),
            )
            .await?;

        resources.database.profiles().delete(target.id).await?;
        info!("Staff {} deleted account {}", auth.user_id, target.id);

        Ok((StatusCode::OK, Json(serde_json::json!({ "deleted": true }))).into_response())
    }

    /// Handle POST /api/admin/coaches - Create a coach account (admin only)
    async fn handle_create_coach(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<CreateCoachRequest>,
    ) -> Result<Response, AppError> {
        let auth = bearer_auth(&headers, &resources)?;
        auth.require_admin()?;

        let email = body.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::invalid_input("A valid email is required"));
        }

        if resources
            .database
            .profiles()
            .get_by_email(&email)
            .await?
            .is_some()
        {
            return Err(AppError::already_exists(format!("Account for {email}")));
        }

        let password_hash = crate::auth::AuthManager::hash_password(&body.password)?;
        let coach = resources
            .database
            .profiles()
            .create(&CreateProfileRequest {
                email,
                password_hash,
                full_name: body.full_name,
                phone: None,
                role: UserRole::Coach,
                referral_code: None,
                referred_by: None,
            })
            .await?;

        info!("Admin {} created coach account {}", auth.user_id, coach.id);
        Ok((StatusCode::CREATED, Json(coach)).into_response())
    }
}
