// ABOUTME: Route handlers for checkout, coupon validation, and the payment webhook
// ABOUTME: The webhook endpoint verifies signatures over the raw body before dispatch
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::billing::gateway::CheckoutParams;
use crate::billing::signature::verify_signature;
use crate::billing::webhook::WebhookProcessor;
use crate::errors::AppError;
use crate::resources::ServerResources;
use crate::routes::bearer_auth;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Checkout session request body
#[derive(Debug, Deserialize)]
pub struct CheckoutSessionRequest {
    /// Gateway price id for the subscription
    pub price_id: String,
    /// Optional coupon code
    pub coupon_code: Option<String>,
}

/// Checkout session response
#[derive(Debug, Serialize)]
pub struct CheckoutSessionResponse {
    /// Session id
    pub session_id: String,
    /// Hosted payment page URL
    pub url: String,
}

/// Coupon validation request body
#[derive(Debug, Deserialize)]
pub struct ValidateCouponRequest {
    /// Coupon code to check
    pub coupon_code: String,
}

/// Coupon validation response.
///
/// Unknown and expired codes are a successful response with
/// `valid: false`, not an error, so the client can show inline feedback.
#[derive(Debug, Serialize)]
pub struct ValidateCouponResponse {
    /// Whether the code can be applied
    pub valid: bool,
    /// Percent discount, when percentage-based
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_off: Option<f64>,
    /// Fixed discount in minor units, when amount-based
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_off: Option<i64>,
    /// Currency of `amount_off`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    /// Discount duration (`once`, `repeating`, `forever`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Months the discount repeats for
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_in_months: Option<i64>,
}

impl ValidateCouponResponse {
    const fn invalid() -> Self {
        Self {
            valid: false,
            percent_off: None,
            amount_off: None,
            currency: None,
            duration: None,
            duration_in_months: None,
        }
    }
}

/// Billing routes handler
pub struct BillingRoutes;

impl BillingRoutes {
    /// Create all billing routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/billing/checkout-session",
                post(Self::handle_checkout_session),
            )
            .route(
                "/api/billing/validate-coupon",
                post(Self::handle_validate_coupon),
            )
            .route("/api/billing/webhook", post(Self::handle_webhook))
            .with_state(resources)
    }

    /// Handle POST /api/billing/checkout-session - Start a hosted checkout
    async fn handle_checkout_session(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<CheckoutSessionRequest>,
    ) -> Result<Response, AppError> {
        let auth = bearer_auth(&headers, &resources)?;
        let profile = resources
            .database
            .profiles()
            .get(auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Profile {}", auth.user_id)))?;

        // Reuse the stored gateway customer when one exists
        let customer_id = if let Some(existing) = profile.stripe_customer_id.clone() {
            existing
        } else {
            let created = resources
                .billing
                .create_customer(&profile.email, profile.full_name.as_deref())
                .await?;
            resources
                .database
                .profiles()
                .set_stripe_customer(profile.id, &created)
                .await?;
            created
        };

        // Coupons are best-effort here: a bad code downgrades to a
        // full-price checkout instead of blocking the purchase
        let coupon = match &body.coupon_code {
            Some(code) if !code.trim().is_empty() => {
                match resources.billing.retrieve_coupon(code.trim()).await {
                    Ok(Some(c)) if c.valid => Some(c.id),
                    Ok(_) => {
                        warn!("Ignoring invalid coupon code at checkout: {:?}", code.trim());
                        None
                    }
                    Err(e) => {
                        warn!("Coupon lookup failed at checkout, proceeding without: {e}");
                        None
                    }
                }
            }
            _ => None,
        };

        let session = resources
            .billing
            .create_checkout_session(&CheckoutParams {
                customer_id,
                price_id: body.price_id,
                coupon,
                user_id: profile.id,
                success_url: resources.config.billing.checkout_success_url.clone(),
                cancel_url: resources.config.billing.checkout_cancel_url.clone(),
            })
            .await?;

        info!("Created checkout session {} for {}", session.id, profile.id);
        Ok((
            StatusCode::OK,
            Json(CheckoutSessionResponse {
                session_id: session.id,
                url: session.url,
            }),
        )
            .into_response())
    }

    /// Handle POST /api/billing/validate-coupon - Inline coupon check
    async fn handle_validate_coupon(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<ValidateCouponRequest>,
    ) -> Result<Response, AppError> {
        bearer_auth(&headers, &resources)?;

        let code = body.coupon_code.trim();
        if code.is_empty() {
            return Err(AppError::missing_field("coupon_code"));
        }

        let response = match resources.billing.retrieve_coupon(code).await? {
            Some(coupon) if coupon.valid => ValidateCouponResponse {
                valid: true,
                percent_off: coupon.percent_off,
                amount_off: coupon.amount_off,
                currency: coupon.currency,
                duration: coupon.duration,
                duration_in_months: coupon.duration_in_months,
            },
            _ => ValidateCouponResponse::invalid(),
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/billing/webhook - Verified gateway event intake
    async fn handle_webhook(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let signature_header = headers
            .get("stripe-signature")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::invalid_input("Missing Stripe-Signature header"))?;

        let payload = std::str::from_utf8(&body)
            .map_err(|_| AppError::invalid_input("Webhook payload is not valid UTF-8"))?;

        verify_signature(
            payload,
            signature_header,
            &resources.config.billing.webhook_secret,
            Utc::now().timestamp(),
        )?;

        let event: serde_json::Value = serde_json::from_str(payload)?;

        let processor = WebhookProcessor::new(
            resources.database.clone(),
            Arc::clone(&resources.billing),
            Arc::clone(&resources.chat),
        );
        processor.process(&event).await?;

        Ok((StatusCode::OK, Json(serde_json::json!({ "received": true }))).into_response())
    }
}
