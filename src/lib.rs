// ABOUTME: FitFlow server library root
// ABOUTME: Declares the billing, plans, data, and HTTP modules of the platform
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

//! # FitFlow Server
//!
//! Backend for the FitFlow fitness-coaching platform: subscription billing
//! against a payment gateway, LLM-drafted workout and nutrition plans with
//! a coach approval workflow, referral accounting, and the REST API the
//! web client consumes.

/// JWT authentication and password handling
pub mod auth;
/// Payment gateway integration and webhook processing
pub mod billing;
/// Environment-based configuration
pub mod config;
/// `SQLite` persistence and per-table managers
pub mod database;
/// Unified error types and HTTP error responses
pub mod errors;
/// Chat completion client
pub mod llm;
/// Structured logging setup
pub mod logging;
/// Signed media URLs
pub mod media;
/// Shared domain models
pub mod models;
/// Plan generation and coach review
pub mod plans;
/// Shared server resources
pub mod resources;
/// HTTP route handlers
pub mod routes;
/// Router assembly and serving
pub mod server;
