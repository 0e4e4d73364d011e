// ABOUTME: Route handlers for the in-app notification feed
// ABOUTME: Users list their own notifications and mark them read
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

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
use std::sync::Arc;
use uuid::Uuid;

/// Notification routes handler
pub struct NotificationRoutes;

impl NotificationRoutes {
    /// Create all notification routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/notifications", get(Self::handle_list))
            .route("/api/notifications/:id/read", post(Self::handle_mark_read))
            .with_state(resources)
    }

    /// Handle GET /api/notifications - The caller's feed, newest first
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = bearer_auth(&headers, &resources)?;
        let notifications = resources
            .database
            .notifications()
            .list(auth.user_id)
            .await?;

        Ok((StatusCode::OK, Json(notifications)).into_response())
    }

    /// Handle POST /api/notifications/:id/read - Mark one notification read
    async fn handle_mark_read(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let auth = bearer_auth(&headers, &resources)?;
        resources
            .database
            .notifications()
            .mark_read(id, auth.user_id)
            .await?;

        Ok((StatusCode::OK, Json(serde_json::json!({ "read": true }))).into_response())
    }
}
