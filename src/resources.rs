// ABOUTME: Shared server resources threaded through all route handlers
// ABOUTME: Bundles the database, auth manager, gateway and LLM clients, and config
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::auth::AuthManager;
use crate::billing::gateway::PaymentGateway;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::llm::ChatCompletion;
use crate::media::MediaSigner;
use std::sync::Arc;

/// Centralized resource container shared across every route module.
///
/// Constructed once at startup and passed as `Arc<ServerResources>`; the
/// external clients sit behind trait objects so tests can swap them for
/// scripted implementations.
pub struct ServerResources {
    /// Database connection and table managers
    pub database: Database,
    /// JWT and password management
    pub auth_manager: AuthManager,
    /// Payment gateway client
    pub billing: Arc<dyn PaymentGateway>,
    /// Chat completion provider
    pub chat: Arc<dyn ChatCompletion>,
    /// Signed media URL generator
    pub media: MediaSigner,
    /// Full server configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Create a new resource container
    #[must_use]
    pub fn new(
        database: Database,
        auth_manager: AuthManager,
        billing: Arc<dyn PaymentGateway>,
        chat: Arc<dyn ChatCompletion>,
        config: Arc<ServerConfig>,
    ) -> Self {
        let media = MediaSigner::from_config(&config.media);
        Self {
            database,
            auth_manager,
            billing,
            chat,
            media,
            config,
        }
    }
}
