// ABOUTME: Route handlers for account signup and login
// ABOUTME: Issues JWTs, assigns referral codes, and links referred signups
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::database::profiles::CreateProfileRequest;
use crate::errors::AppError;
use crate::models::{Profile, UserRole};
use crate::resources::ServerResources;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

const REFERRAL_CODE_LEN: usize = 8;
const MIN_PASSWORD_LEN: usize = 8;

/// Signup request body
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    /// Login email
    pub email: String,
    /// Plaintext password
    pub password: String,
    /// Display name
    pub full_name: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// Referral code of an existing user, if the signup came through a link
    pub referral_code: Option<String>,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login email
    pub email: String,
    /// Plaintext password
    pub password: String,
}

/// Response for signup and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Bearer token for subsequent requests
    pub token: String,
    /// The authenticated profile
    pub profile: Profile,
}

/// Generate a shareable referral code
fn generate_referral_code() -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    let mut rng = rand::thread_rng();
    (0..REFERRAL_CODE_LEN)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect()
}

/// Authentication routes handler
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/signup", post(Self::handle_signup))
            .route("/api/auth/login", post(Self::handle_login))
            .with_state(resources)
    }

    /// Handle POST /api/auth/signup - Create an account and issue a token
    async fn handle_signup(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<SignupRequest>,
    ) -> Result<Response, AppError> {
        let email = body.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::invalid_input("A valid email is required"));
        }
        if body.password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::invalid_input(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        // A bad referral code should not block signup
        let referred_by = match &body.referral_code {
            Some(code) if !code.trim().is_empty() => {
                let referrer = resources
                    .database
                    .profiles()
                    .get_by_referral_code(code.trim())
                    .await?;
                if referrer.is_none() {
                    warn!("Signup with unknown referral code {:?}", code.trim());
                }
                referrer.map(|p| p.id)
            }
            _ => None,
        };

        let password_hash = crate::auth::AuthManager::hash_password(&body.password)?;
        let request = CreateProfileRequest {
            email,
            password_hash,
            full_name: body.full_name,
            phone: body.phone,
            role: UserRole::Student,
            referral_code: Some(generate_referral_code()),
            referred_by,
        };

        let profile = resources.database.profiles().create(&request).await?;

        if let Some(referrer_id) = referred_by {
            resources
                .database
                .referrals()
                .create(referrer_id, profile.id)
                .await?;
            info!("Linked signup {} to referrer {referrer_id}", profile.id);
        }

        let token = resources.auth_manager.generate_token(&profile)?;
        Ok((StatusCode::CREATED, Json(AuthResponse { token, profile })).into_response())
    }

    /// Handle POST /api/auth/login - Verify credentials and issue a token
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<LoginRequest>,
    ) -> Result<Response, AppError> {
        let email = body.email.trim().to_lowercase();

        let profile = resources
            .database
            .profiles()
            .get_by_email(&email)
            .await?
            .ok_or_else(|| AppError::auth_invalid("Invalid email or password"))?;

        crate::auth::AuthManager::verify_password(&body.password, &profile.password_hash)?;

        let token = resources.auth_manager.generate_token(&profile)?;
        Ok((StatusCode::OK, Json(AuthResponse { token, profile })).into_response())
    }
}
