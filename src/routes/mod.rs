// ABOUTME: HTTP route modules for the FitFlow REST API
// ABOUTME: Each module owns a resource area and registers its own router
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

//! # Routes
//!
//! REST API surface. Every module exposes a unit struct with a
//! `routes(Arc<ServerResources>)` constructor; [`crate::server`]
//! merges them into the final router.

pub mod admin;
pub mod auth;
pub mod billing;
pub mod chat;
pub mod exercises;
pub mod health;
pub mod notifications;
pub mod plans;
pub mod profiles;
pub mod referrals;

use crate::auth::AuthResult;
use crate::errors::AppResult;
use crate::resources::ServerResources;
use axum::http::HeaderMap;
use std::sync::Arc;

/// Authenticate the request from its `Authorization` header
pub(crate) fn bearer_auth(
    headers: &HeaderMap,
    resources: &Arc<ServerResources>,
) -> AppResult<AuthResult> {
    let header = headers.get("authorization").and_then(|h| h.to_str().ok());
    resources.auth_manager.authenticate(header)
}
