// ABOUTME: Route handlers for student plan access and the coach review queue
// ABOUTME: Coach endpoints cover pending plans, review decisions, students, and referrals
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::errors::AppError;
use crate::models::PlanReviewStatus;
use crate::plans::approval::{apply_review, PlanReviewAction};
use crate::resources::ServerResources;
use crate::routes::bearer_auth;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

/// Plan and coach workflow routes handler
pub struct PlanRoutes;

impl PlanRoutes {
    /// Create all plan routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/plans", get(Self::handle_list_own))
            .route("/api/coach/plans/pending", get(Self::handle_list_pending))
            .route("/api/coach/plans/:id/review", post(Self::handle_review))
            .route("/api/coach/students", get(Self::handle_list_students))
            .route("/api/coach/referrals", get(Self::handle_list_referrals))
            .with_state(resources)
    }

    /// Handle GET /api/plans - The caller's own plans.
    ///
    /// Content is only exposed once a coach has approved the plan;
    /// pending and rejected rows keep their status visible but carry
    /// no content.
    async fn handle_list_own(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = bearer_auth(&headers, &resources)?;
        let mut plans = resources.database.plans().list_for_user(auth.user_id).await?;
        for plan in &mut plans {
            if plan.status != PlanReviewStatus::Approved {
                plan.content = serde_json::Value::Null;
            }
        }

        Ok((StatusCode::OK, Json(plans)).into_response())
    }

    /// Handle GET /api/coach/plans/pending - Review queue, oldest first
    async fn handle_list_pending(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = bearer_auth(&headers, &resources)?;
        auth.require_staff()?;

        let pending = resources.database.plans().list_pending().await?;
        Ok((StatusCode::OK, Json(pending)).into_response())
    }

    /// Handle POST /api/coach/plans/:id/review - Apply a review decision
    async fn handle_review(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(plan_id): Path<Uuid>,
        Json(action): Json<PlanReviewAction>,
    ) -> Result<Response, AppError> {
        let auth = bearer_auth(&headers, &resources)?;
        auth.require_staff()?;

        let plan = apply_review(&resources.database, plan_id, auth.user_id, &action).await?;
        Ok((StatusCode::OK, Json(plan)).into_response())
    }

    /// Handle GET /api/coach/students - All student profiles
    async fn handle_list_students(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = bearer_auth(&headers, &resources)?;
        auth.require_staff()?;

        let students = resources.database.profiles().list_students().await?;
        Ok((StatusCode::OK, Json(students)).into_response())
    }

    /// Handle GET /api/coach/referrals - Referral overview with identities
    async fn handle_list_referrals(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = bearer_auth(&headers, &resources)?;
        auth.require_staff()?;

        let referrals = resources.database.referrals().list_overview().await?;
        Ok((StatusCode::OK, Json(referrals)).into_response())
    }
}
