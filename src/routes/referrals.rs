// ABOUTME: Route handlers for a user's own referral code and history
// ABOUTME: Shows the shareable code, referral rows, and remaining discount cycles
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::errors::AppError;
use crate::models::Referral;
use crate::resources::ServerResources;
use crate::routes::bearer_auth;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Response for the caller's referral state
#[derive(Debug, Serialize)]
pub struct ReferralSummaryResponse {
    /// The caller's shareable code
    pub referral_code: Option<String>,
    /// Referral-discounted billing cycles still unused
    pub discount_remaining: i64,
    /// Referrals made by the caller, newest first
    pub referrals: Vec<Referral>,
}

/// Referral routes handler
pub struct ReferralRoutes;

impl ReferralRoutes {
    /// Create all referral routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/referrals", get(Self::handle_summary))
            .with_state(resources)
    }

    /// Handle GET /api/referrals - The caller's code and referral history
    async fn handle_summary(
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

        let referrals = resources
            .database
            .referrals()
            .list_for_referrer(auth.user_id)
            .await?;

        Ok((
            StatusCode::OK,
            Json(ReferralSummaryResponse {
                referral_code: profile.referral_code,
                discount_remaining: profile.discount_remaining,
                referrals,
            }),
        )
            .into_response())
    }
}
