// ABOUTME: Health check endpoint for deployment probes
// ABOUTME: Verifies database connectivity with a trivial query
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::resources::ServerResources;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use std::sync::Arc;

/// Health check routes handler
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the health route
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::handle_health))
            .with_state(resources)
    }

    /// Handle GET /health - Liveness and database connectivity
    async fn handle_health(State(resources): State<Arc<ServerResources>>) -> Response {
        let db_ok = sqlx::query("SELECT 1")
            .execute(resources.database.pool())
            .await
            .is_ok();

        let status = if db_ok {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };

        (
            status,
            Json(serde_json::json!({
                "status": if db_ok { "ok" } else { "degraded" },
                "database": db_ok,
                "timestamp": Utc::now().to_rfc3339(),
            })),
        )
            .into_response()
    }
}
