// ABOUTME: Webhook event dispatch driving subscription lifecycle transitions
// ABOUTME: Applies checkout, renewal, failure, cancellation, and update events to profiles
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::billing::gateway::PaymentGateway;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::llm::ChatCompletion;
use crate::models::{PlanStatus, SubscriptionStatus};
use crate::plans::generator::PlanGenerator;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Fallback billing period length when the gateway does not supply one
const DEFAULT_PERIOD_DAYS: i64 = 30;

/// Applies verified payment gateway events to local subscription state.
///
/// Event handlers are tolerant by design: an event referencing an unknown
/// user or subscription logs and returns success, because the gateway
/// retries failed deliveries and the data will never match.
pub struct WebhookProcessor {
    database: Database,
    gateway: Arc<dyn PaymentGateway>,
    chat: Arc<dyn ChatCompletion>,
}

impl WebhookProcessor {
    /// Create a new webhook processor
    #[must_use]
    pub fn new(
        database: Database,
        gateway: Arc<dyn PaymentGateway>,
        chat: Arc<dyn ChatCompletion>,
    ) -> Self {
        Self {
            database,
            gateway,
            chat,
        }
    }

    /// Store and dispatch one verified event payload
    ///
    /// # Errors
    ///
    /// Returns an error only when local persistence fails; unknown event
    /// types and unmatched references are logged and succeed.
    pub async fn process(&self, event: &serde_json::Value) -> AppResult<()> {
        let event_type = event
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| AppError::invalid_input("Event payload missing type"))?
            .to_owned();

        self.database
            .webhook_events()
            .record(&event_type, event)
            .await?;

        let object = event
            .pointer("/data/object")
            .cloned()
            .unwrap_or(serde_json::Value::Null);

        match event_type.as_str() {
            "checkout.session.completed" => self.handle_checkout_completed(&object).await,
            "invoice.payment_succeeded" => self.handle_payment_succeeded(&object).await,
            "invoice.payment_failed" => self.handle_payment_failed(&object).await,
            "customer.subscription.deleted" => self.handle_subscription_deleted(&object).await,
            "customer.subscription.updated" => self.handle_subscription_updated(&object).await,
            other => {
                debug!("Ignoring unhandled webhook event type: {other}");
                Ok(())
            }
        }
    }

    /// Checkout finished: activate the subscription, credit any referrer,
    /// and kick off plan generation when onboarding is complete
    async fn handle_checkout_completed(&self, object: &serde_json::Value) -> AppResult<()> {
        let Some(user_id) = object
            .pointer("/metadata/user_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
        else {
            warn!("checkout.session.completed without usable metadata.user_id, skipping");
            return Ok(());
        };

        if self.database.profiles().get(user_id).await?.is_none() {
            warn!("checkout.session.completed for unknown user {user_id}, skipping");
            return Ok(());
        }

        let subscription_id = object.get("subscription").and_then(|v| v.as_str());
        let period_end = Utc::now() + Duration::days(DEFAULT_PERIOD_DAYS);

        self.database
            .profiles()
            .mark_checkout_completed(user_id, subscription_id, period_end)
            .await?;

        self.database
            .notifications()
            .create(
                user_id,
                "payment_success",
                "Pagamento confirmado! Sua assinatura está ativa.",
            )
            .await?;

        if let Some(referral) = self.database.referrals().activate_for_referred(user_id).await? {
            self.database
                .profiles()
                .increment_discount(referral.referrer_id)
                .await?;
            info!(
                "Referral {} activated, credited referrer {}",
                referral.id, referral.referrer_id
            );
        }

        let onboarded = self.database.anamnese().exists(user_id).await?
            && self.database.evaluations().latest(user_id).await?.is_some();
        if !onboarded {
            info!("User {user_id} subscribed before completing onboarding, deferring plans");
            return Ok(());
        }

        self.database
            .profiles()
            .set_plan_status(user_id, Some(PlanStatus::Generating))
            .await?;

        let generator = PlanGenerator::new(self.database.clone(), Arc::clone(&self.chat));
        if let Err(e) = generator.generate_for_user(user_id).await {
            warn!("Plan generation failed for {user_id}: {e}");
            self.database
                .profiles()
                .set_plan_status(user_id, Some(PlanStatus::Pending))
                .await?;
            self.database
                .notifications()
                .create(
                    user_id,
                    "plan_generation_failed",
                    "Não foi possível gerar seus planos automaticamente. Nossa equipe vai preparar seus planos manualmente.",
                )
                .await?;
        }

        Ok(())
    }

    /// Recurring invoice paid: extend the period and consume a referral credit
    async fn handle_payment_succeeded(&self, object: &serde_json::Value) -> AppResult<()> {
        let Some(subscription_id) = object.get("subscription").and_then(|v| v.as_str()) else {
            debug!("invoice.payment_succeeded without subscription id, skipping");
            return Ok(());
        };

        let Some(profile) = self
            .database
            .profiles()
            .get_by_subscription_id(subscription_id)
            .await?
        else {
            warn!("invoice.payment_succeeded for unknown subscription {subscription_id}");
            return Ok(());
        };

        // Period end comes from the gateway; renewal still succeeds without it
        let period_end = match self.gateway.retrieve_subscription(subscription_id).await {
            Ok(sub) => sub.current_period_end,
            Err(e) => {
                warn!("Could not retrieve subscription {subscription_id}: {e}");
                None
            }
        };

        self.database
            .profiles()
            .mark_subscription_renewed(profile.id, period_end)
            .await?;

        if profile.discount_remaining > 0 {
            self.database.profiles().decrement_discount(profile.id).await?;
            info!(
                "Consumed one referral discount cycle for {} ({} remaining before this)",
                profile.id, profile.discount_remaining
            );
        }

        self.database
            .notifications()
            .create(
                profile.id,
                "payment_success",
                "Pagamento recebido. Sua assinatura foi renovada.",
            )
            .await?;

        Ok(())
    }

    /// Invoice payment failed: mark past due and tell the user
    async fn handle_payment_failed(&self, object: &serde_json::Value) -> AppResult<()> {
        let Some(subscription_id) = object.get("subscription").and_then(|v| v.as_str()) else {
            debug!("invoice.payment_failed without subscription id, skipping");
            return Ok(());
        };

        let Some(profile) = self
            .database
            .profiles()
            .get_by_subscription_id(subscription_id)
            .await?
        else {
            warn!("invoice.payment_failed for unknown subscription {subscription_id}");
            return Ok(());
        };

        self.database
            .profiles()
            .set_subscription_status(profile.id, SubscriptionStatus::PastDue, None)
            .await?;

        self.database
            .notifications()
            .create(
                profile.id,
                "payment_failed",
                "Não conseguimos processar seu pagamento. Atualize sua forma de pagamento.",
            )
            .await?;

        Ok(())
    }

    /// Subscription gone at the gateway: cancel locally
    async fn handle_subscription_deleted(&self, object: &serde_json::Value) -> AppResult<()> {
        let Some(subscription_id) = object.get("id").and_then(|v| v.as_str()) else {
            debug!("customer.subscription.deleted without id, skipping");
            return Ok(());
        };

        let Some(profile) = self
            .database
            .profiles()
            .get_by_subscription_id(subscription_id)
            .await?
        else {
            warn!("customer.subscription.deleted for unknown subscription {subscription_id}");
            return Ok(());
        };

        self.database.profiles().clear_subscription(profile.id).await?;

        self.database
            .notifications()
            .create(
                profile.id,
                "subscription_canceled",
                "Sua assinatura foi cancelada.",
            )
            .await?;

        Ok(())
    }

    /// Gateway-side status change: mirror it when we have a local counterpart
    async fn handle_subscription_updated(&self, object: &serde_json::Value) -> AppResult<()> {
        let Some(subscription_id) = object.get("id").and_then(|v| v.as_str()) else {
            debug!("customer.subscription.updated without id, skipping");
            return Ok(());
        };

        let Some(profile) = self
            .database
            .profiles()
            .get_by_subscription_id(subscription_id)
            .await?
        else {
            debug!("customer.subscription.updated for unknown subscription {subscription_id}");
            return Ok(());
        };

        let gateway_status = object.get("status").and_then(|v| v.as_str()).unwrap_or("");
        let Some(status) = SubscriptionStatus::from_gateway(gateway_status) else {
            debug!("No local mapping for gateway status {gateway_status:?}, skipping");
            return Ok(());
        };

        let period_end = object
            .get("current_period_end")
            .and_then(serde_json::Value::as_i64)
            .and_then(|ts| DateTime::from_timestamp(ts, 0));

        self.database
            .profiles()
            .set_subscription_status(profile.id, status, period_end)
            .await?;

        Ok(())
    }
}
