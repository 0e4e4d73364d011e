// ABOUTME: Subscription billing orchestration against the payment gateway
// ABOUTME: Checkout sessions, coupon validation, webhook verification and dispatch
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

//! # Billing
//!
//! Everything that talks to or reacts to the payment gateway. The gateway
//! API sits behind [`gateway::PaymentGateway`] so webhook and checkout
//! logic can be tested with scripted implementations. Webhook payloads are
//! authenticated by [`signature`] before [`webhook::WebhookProcessor`]
//! applies their subscription state transitions.

pub mod gateway;
pub mod signature;
pub mod webhook;
