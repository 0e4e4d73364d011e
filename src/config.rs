// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, typed sub-configs, and runtime configuration parsing
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

//! Environment-based configuration management for production deployment

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Default HTTP port when `HTTP_PORT` is unset
const DEFAULT_HTTP_PORT: u16 = 8081;

/// Default JWT lifetime in hours
const DEFAULT_JWT_EXPIRY_HOURS: u64 = 24;

/// Environment type for security and other configurations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated testing
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL (`sqlite:fitflow.db` or `sqlite::memory:`)
    pub url: String,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret for signing JWTs
    pub jwt_secret: String,
    /// JWT lifetime in hours
    pub jwt_expiry_hours: u64,
}

/// Payment gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Gateway API secret key
    pub secret_key: String,
    /// Shared secret for webhook signature verification
    pub webhook_secret: String,
    /// Redirect target after successful checkout
    pub checkout_success_url: String,
    /// Redirect target after canceled checkout
    pub checkout_cancel_url: String,
}

/// LLM inference endpoint configuration (`OpenAI`-compatible chat completions)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the chat-completions API
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// API key (may be empty for local servers)
    pub api_key: String,
}

/// Signed media URL configuration for exercise videos and photos
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Public base URL the signed paths are served from
    pub base_url: String,
    /// Secret for signing media URLs
    pub signing_secret: String,
    /// Signed URL validity in seconds
    pub url_expiry_secs: i64,
}

/// Complete server configuration loaded from the process environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Database settings
    pub database: DatabaseConfig,
    /// Auth settings
    pub auth: AuthConfig,
    /// Payment gateway settings
    pub billing: BillingConfig,
    /// LLM endpoint settings
    pub llm: LlmConfig,
    /// Signed media URL settings
    pub media: MediaConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Required: `JWT_SECRET`, `STRIPE_SECRET_KEY`, `STRIPE_WEBHOOK_SECRET`,
    /// `LLM_API_KEY` (unless a local LLM base URL is configured).
    /// Everything else has development defaults.
    ///
    /// # Errors
    ///
    /// Returns an error when a required variable is missing or a numeric
    /// variable fails to parse.
    pub fn from_env() -> Result<Self> {
        let http_port = match env::var("HTTP_PORT") {
            Ok(port) => port.parse().context("Invalid HTTP_PORT")?,
            Err(_) => DEFAULT_HTTP_PORT,
        };

        let environment = Environment::from_str_or_default(
            &env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        );

        let jwt_expiry_hours = match env::var("JWT_EXPIRY_HOURS") {
            Ok(hours) => hours.parse().context("Invalid JWT_EXPIRY_HOURS")?,
            Err(_) => DEFAULT_JWT_EXPIRY_HOURS,
        };

        Ok(Self {
            http_port,
            environment,
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:fitflow.db".into()),
            },
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
                jwt_expiry_hours,
            },
            billing: BillingConfig {
                secret_key: env::var("STRIPE_SECRET_KEY")
                    .context("STRIPE_SECRET_KEY must be set")?,
                webhook_secret: env::var("STRIPE_WEBHOOK_SECRET")
                    .context("STRIPE_WEBHOOK_SECRET must be set")?,
                checkout_success_url: env::var("CHECKOUT_SUCCESS_URL").unwrap_or_else(|_| {
                    "http://localhost:5173/subscription-success?session_id={CHECKOUT_SESSION_ID}"
                        .into()
                }),
                checkout_cancel_url: env::var("CHECKOUT_CANCEL_URL")
                    .unwrap_or_else(|_| "http://localhost:5173/subscription".into()),
            },
            llm: LlmConfig {
                base_url: env::var("LLM_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
                model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into()),
                api_key: env::var("LLM_API_KEY").unwrap_or_default(),
            },
            media: MediaConfig {
                base_url: env::var("MEDIA_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:8081/media".into()),
                signing_secret: env::var("MEDIA_SIGNING_SECRET")
                    .unwrap_or_else(|_| "dev-media-secret".into()),
                url_expiry_secs: 3600,
            },
        })
    }

    /// One-line startup summary, with secrets elided
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "environment={} http_port={} database={} llm_model={} llm_base_url={}",
            self.environment, self.http_port, self.database.url, self.llm.model, self.llm.base_url
        )
    }
}
