// ABOUTME: HTTP server assembly and lifecycle
// ABOUTME: Merges route modules, layers middleware, and serves until shutdown
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

//! # Server
//!
//! Assembles the full axum router from the route modules and runs it.

use crate::resources::ServerResources;
use crate::routes::{
    admin::AdminRoutes, auth::AuthRoutes, billing::BillingRoutes, chat::ChatRoutes,
    exercises::ExerciseRoutes, health::HealthRoutes, notifications::NotificationRoutes,
    plans::PlanRoutes, profiles::ProfileRoutes, referrals::ReferralRoutes,
};
use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Build the complete application router
#[must_use]
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes(Arc::clone(&resources)))
        .merge(AuthRoutes::routes(Arc::clone(&resources)))
        .merge(ProfileRoutes::routes(Arc::clone(&resources)))
        .merge(PlanRoutes::routes(Arc::clone(&resources)))
        .merge(BillingRoutes::routes(Arc::clone(&resources)))
        .merge(NotificationRoutes::routes(Arc::clone(&resources)))
        .merge(ReferralRoutes::routes(Arc::clone(&resources)))
        .merge(ExerciseRoutes::routes(Arc::clone(&resources)))
        .merge(ChatRoutes::routes(Arc::clone(&resources)))
        .merge(AdminRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind the configured port and serve requests until the process exits
///
/// # Errors
///
/// Returns an error if the port cannot be bound or the server fails.
pub async fn serve(resources: Arc<ServerResources>) -> Result<()> {
    let port = resources.config.http_port;
    let router = build_router(resources);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!("FitFlow server listening on port {port}");
    axum::serve(listener, router)
        .await
        .context("HTTP server error")
}
