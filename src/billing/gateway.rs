// ABOUTME: Payment gateway client trait and the Stripe HTTP implementation
// ABOUTME: Customers, checkout sessions, coupons, and subscription lookups
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::config::BillingConfig;
use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// Parameters for creating a hosted checkout session
#[derive(Debug, Clone)]
pub struct CheckoutParams {
    /// Gateway customer id to bill
    pub customer_id: String,
    /// Price identifier for the subscription
    pub price_id: String,
    /// Coupon to attach, already validated by the caller
    pub coupon: Option<String>,
    /// Local user id carried through checkout metadata
    pub user_id: Uuid,
    /// Redirect after successful payment
    pub success_url: String,
    /// Redirect after abandonment
    pub cancel_url: String,
}

/// A created hosted checkout session
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Session id
    pub id: String,
    /// Hosted payment page URL the client redirects to
    pub url: String,
}

/// Coupon details from the gateway
#[derive(Debug, Clone, Deserialize)]
pub struct Coupon {
    /// Coupon id (the code customers type in)
    pub id: String,
    /// Whether the gateway still honors this coupon
    pub valid: bool,
    /// Percent discount, when percentage-based
    pub percent_off: Option<f64>,
    /// Fixed discount in minor units, when amount-based
    pub amount_off: Option<i64>,
    /// Currency of `amount_off`
    pub currency: Option<String>,
    /// `once`, `repeating`, or `forever`
    pub duration: Option<String>,
    /// Months the discount repeats for, when `repeating`
    pub duration_in_months: Option<i64>,
}

/// Subscription details from the gateway
#[derive(Debug, Clone)]
pub struct GatewaySubscription {
    /// Subscription id
    pub id: String,
    /// Gateway status string (`active`, `past_due`, ...)
    pub status: String,
    /// End of the current billing period
    pub current_period_end: Option<DateTime<Utc>>,
}

/// Payment gateway operations used by checkout and webhook handling
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a customer and return its gateway id
    async fn create_customer(&self, email: &str, name: Option<&str>) -> AppResult<String>;

    /// Create a hosted checkout session for a subscription
    async fn create_checkout_session(&self, params: &CheckoutParams) -> AppResult<CheckoutSession>;

    /// Look up a coupon by code; `Ok(None)` means the code does not exist
    async fn retrieve_coupon(&self, code: &str) -> AppResult<Option<Coupon>>;

    /// Look up a subscription by id
    async fn retrieve_subscription(&self, subscription_id: &str) -> AppResult<GatewaySubscription>;
}

#[derive(Deserialize)]
struct CustomerResponse {
    id: String,
}

#[derive(Deserialize)]
struct SubscriptionResponse {
    id: String,
    status: String,
    current_period_end: Option<i64>,
}

/// Stripe REST API client
pub struct StripeClient {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripeClient {
    const API_BASE: &'static str = "https://api.stripe.com/v1";

    /// Build a client from billing configuration
    #[must_use]
    pub fn from_config(config: &BillingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: Self::API_BASE.to_owned(),
            secret_key: config.secret_key.clone(),
        }
    }

    /// Build a client against a non-default API base (used by tests)
    #[must_use]
    pub fn with_api_base(secret_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
            secret_key: secret_key.into(),
        }
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}/{path}", self.api_base);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.secret_key, None::<&str>)
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::external_service("stripe", format!("Request failed: {e}")))?;

        Self::decode(response).await
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let url = format!("{}/{path}", self.api_base);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .map_err(|e| AppError::external_service("stripe", format!("Request failed: {e}")))?;

        Self::decode(response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::not_found("Gateway resource"));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::external_service(
                "stripe",
                format!("API returned {status}: {detail}"),
            ));
        }
        response
            .json()
            .await
            .map_err(|e| AppError::external_service("stripe", format!("Invalid response: {e}")))
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_customer(&self, email: &str, name: Option<&str>) -> AppResult<String> {
        let mut form = vec![("email", email.to_owned())];
        if let Some(name) = name {
            form.push(("name", name.to_owned()));
        }
        let customer: CustomerResponse = self.post_form("customers", &form).await?;
        Ok(customer.id)
    }

    async fn create_checkout_session(&self, params: &CheckoutParams) -> AppResult<CheckoutSession> {
        let mut form = vec![
            ("customer", params.customer_id.clone()),
            ("mode", "subscription".to_owned()),
            ("line_items[0][price]", params.price_id.clone()),
            ("line_items[0][quantity]", "1".to_owned()),
            ("success_url", params.success_url.clone()),
            ("cancel_url", params.cancel_url.clone()),
            ("metadata[user_id]", params.user_id.to_string()),
        ];
        if let Some(coupon) = &params.coupon {
            form.push(("discounts[0][coupon]", coupon.clone()));
        }

        self.post_form("checkout/sessions", &form).await
    }

    async fn retrieve_coupon(&self, code: &str) -> AppResult<Option<Coupon>> {
        match self.get::<Coupon>(&format!("coupons/{code}")).await {
            Ok(coupon) => Ok(Some(coupon)),
            Err(e) if e.code == crate::errors::ErrorCode::ResourceNotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn retrieve_subscription(&self, subscription_id: &str) -> AppResult<GatewaySubscription> {
        let sub: SubscriptionResponse =
            self.get(&format!("subscriptions/{subscription_id}")).await?;

        Ok(GatewaySubscription {
            id: sub.id,
            status: sub.status,
            current_period_end: sub
                .current_period_end
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
        })
    }
}
