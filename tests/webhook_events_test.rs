// ABOUTME: Integration tests for webhook-driven subscription state transitions
// ABOUTME: Covers checkout activation, renewals, failures, cancellation, and referral credits

#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use chrono::{Duration, Utc};
use common::{create_student, setup_database, MockChat, MockGateway};
use fitflow_server::billing::gateway::GatewaySubscription;
use fitflow_server::billing::webhook::WebhookProcessor;
use fitflow_server::database::evaluations::NewEvaluation;
use fitflow_server::database::Database;
use fitflow_server::models::{Anamnese, PlanStatus, SubscriptionStatus};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

fn processor(db: &Database, gateway: Arc<MockGateway>, chat: Arc<MockChat>) -> WebhookProcessor {
    WebhookProcessor::new(db.clone(), gateway, chat)
}

fn checkout_event(user_id: Uuid, subscription_id: &str) -> serde_json::Value {
    json!({
        "type": "checkout.session.completed",
        "data": { "object": {
            "id": "cs_test_1",
            "subscription": subscription_id,
            "metadata": { "user_id": user_id.to_string() }
        }}
    })
}

async fn complete_onboarding(db: &Database, user_id: Uuid) {
    db.anamnese()
        .upsert(&Anamnese {
            user_id,
            main_goal: Some("emagrecimento".into()),
            ..Anamnese::default()
        })
        .await
        .unwrap();
    db.evaluations()
        .create(
            user_id,
            &NewEvaluation {
                weight: Some(80.0),
                height: Some(180.0),
                ..NewEvaluation::default()
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_checkout_completed_activates_subscription() {
    let db = setup_database().await;
    let student = create_student(&db, "ana@example.com").await;
    let chat = Arc::new(MockChat::default());
    let proc = processor(&db, Arc::new(MockGateway::default()), chat);

    proc.process(&checkout_event(student.id, "sub_123"))
        .await
        .unwrap();

    let profile = db.profiles().get(student.id).await.unwrap().unwrap();
    assert_eq!(profile.subscription_status, SubscriptionStatus::Active);
    assert_eq!(profile.stripe_subscription_id.as_deref(), Some("sub_123"));
    assert!(profile.current_period_end.unwrap() > Utc::now());

    let notifications = db.notifications().list(student.id).await.unwrap();
    assert!(notifications
        .iter()
        .any(|n| n.notification_type == "payment_success"));

    // Event payload is stored for inspection
    let events = db.webhook_events().recent(10).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "checkout.session.completed");
}

#[tokio::test]
async fn test_checkout_without_user_metadata_is_a_noop() {
    let db = setup_database().await;
    let student = create_student(&db, "bruno@example.com").await;
    let proc = processor(
        &db,
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    );

    let event = json!({
        "type": "checkout.session.completed",
        "data": { "object": { "id": "cs_test_1", "subscription": "sub_9" } }
    });
    proc.process(&event).await.unwrap();

    let profile = db.profiles().get(student.id).await.unwrap().unwrap();
    assert_eq!(profile.subscription_status, SubscriptionStatus::None);
    // The event itself is still recorded
    assert_eq!(db.webhook_events().recent(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_checkout_triggers_plan_generation_when_onboarded() {
    let db = setup_database().await;
    let student = create_student(&db, "carla@example.com").await;
    complete_onboarding(&db, student.id).await;

    let chat = Arc::new(MockChat::with_replies(vec![
        r#"{"titulo": "Treino A", "dias": []}"#,
        r#"{"titulo": "Dieta A", "refeicoes": []}"#,
    ]));
    let proc = processor(&db, Arc::new(MockGateway::default()), Arc::clone(&chat));

    proc.process(&checkout_event(student.id, "sub_1")).await.unwrap();

    let plans = db.plans().list_for_user(student.id).await.unwrap();
    assert_eq!(plans.len(), 2);

    let profile = db.profiles().get(student.id).await.unwrap().unwrap();
    assert_eq!(profile.plan_status, Some(PlanStatus::Generating));
}

#[tokio::test]
async fn test_checkout_defers_plans_without_onboarding() {
    let db = setup_database().await;
    let student = create_student(&db, "davi@example.com").await;
    let chat = Arc::new(MockChat::default());
    let proc = processor(&db, Arc::new(MockGateway::default()), Arc::clone(&chat));

    proc.process(&checkout_event(student.id, "sub_1")).await.unwrap();

    let profile = db.profiles().get(student.id).await.unwrap().unwrap();
    assert_eq!(profile.subscription_status, SubscriptionStatus::Active);
    assert_eq!(profile.plan_status, None);
    assert!(db.plans().list_for_user(student.id).await.unwrap().is_empty());
    assert_eq!(chat.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_generation_failure_falls_back_to_pending() {
    let db = setup_database().await;
    let student = create_student(&db, "elisa@example.com").await;
    complete_onboarding(&db, student.id).await;

    // No scripted replies: every completion call fails
    let proc = processor(
        &db,
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    );

    // The webhook itself must still succeed
    proc.process(&checkout_event(student.id, "sub_1")).await.unwrap();

    let profile = db.profiles().get(student.id).await.unwrap().unwrap();
    assert_eq!(profile.subscription_status, SubscriptionStatus::Active);
    assert_eq!(profile.plan_status, Some(PlanStatus::Pending));

    let notifications = db.notifications().list(student.id).await.unwrap();
    assert!(notifications
        .iter()
        .any(|n| n.notification_type == "plan_generation_failed"));
}

#[tokio::test]
async fn test_checkout_activates_referral_and_credits_referrer() {
    let db = setup_database().await;
    let referrer = create_student(&db, "referrer@example.com").await;
    let referred = create_student(&db, "referred@example.com").await;
    db.referrals().create(referrer.id, referred.id).await.unwrap();

    let proc = processor(
        &db,
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    );
    proc.process(&checkout_event(referred.id, "sub_r")).await.unwrap();

    let referrals = db.referrals().list_for_referrer(referrer.id).await.unwrap();
    assert_eq!(referrals[0].status, "active");
    assert!(referrals[0].discount_applied);

    let referrer = db.profiles().get(referrer.id).await.unwrap().unwrap();
    assert_eq!(referrer.discount_remaining, 1);

    // A second checkout must not credit the referrer again
    proc.process(&checkout_event(referred.id, "sub_r")).await.unwrap();
    let referrer = db.profiles().get(referrer.id).await.unwrap().unwrap();
    assert_eq!(referrer.discount_remaining, 1);
}

#[tokio::test]
async fn test_payment_succeeded_renews_and_consumes_discount() {
    let db = setup_database().await;
    let student = create_student(&db, "fabio@example.com").await;
    db.profiles()
        .mark_checkout_completed(student.id, Some("sub_2"), Utc::now())
        .await
        .unwrap();
    db.profiles().increment_discount(student.id).await.unwrap();

    let gateway = Arc::new(MockGateway::default());
    let new_period_end = Utc::now() + Duration::days(30);
    gateway.add_subscription(GatewaySubscription {
        id: "sub_2".into(),
        status: "active".into(),
        current_period_end: Some(new_period_end),
    });

    let proc = processor(&db, gateway, Arc::new(MockChat::default()));
    let event = json!({
        "type": "invoice.payment_succeeded",
        "data": { "object": { "id": "in_1", "subscription": "sub_2" } }
    });
    proc.process(&event).await.unwrap();

    let profile = db.profiles().get(student.id).await.unwrap().unwrap();
    assert_eq!(profile.subscription_status, SubscriptionStatus::Active);
    assert_eq!(profile.discount_remaining, 0);
    let stored_end = profile.current_period_end.unwrap();
    assert!((stored_end - new_period_end).num_seconds().abs() <= 1);
}

#[tokio::test]
async fn test_payment_succeeded_without_discount_stays_at_zero() {
    let db = setup_database().await;
    let student = create_student(&db, "gina@example.com").await;
    db.profiles()
        .mark_checkout_completed(student.id, Some("sub_3"), Utc::now())
        .await
        .unwrap();

    let proc = processor(
        &db,
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    );
    let event = json!({
        "type": "invoice.payment_succeeded",
        "data": { "object": { "subscription": "sub_3" } }
    });
    // Gateway lookup fails but the renewal still lands
    proc.process(&event).await.unwrap();

    let profile = db.profiles().get(student.id).await.unwrap().unwrap();
    assert_eq!(profile.subscription_status, SubscriptionStatus::Active);
    assert_eq!(profile.discount_remaining, 0);
}

#[tokio::test]
async fn test_payment_failed_marks_past_due() {
    let db = setup_database().await;
    let student = create_student(&db, "hugo@example.com").await;
    db.profiles()
        .mark_checkout_completed(student.id, Some("sub_4"), Utc::now())
        .await
        .unwrap();

    let proc = processor(
        &db,
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    );
    let event = json!({
        "type": "invoice.payment_failed",
        "data": { "object": { "subscription": "sub_4" } }
    });
    proc.process(&event).await.unwrap();

    let profile = db.profiles().get(student.id).await.unwrap().unwrap();
    assert_eq!(profile.subscription_status, SubscriptionStatus::PastDue);

    let notifications = db.notifications().list(student.id).await.unwrap();
    assert!(notifications
        .iter()
        .any(|n| n.notification_type == "payment_failed"));
}

#[tokio::test]
async fn test_subscription_deleted_cancels_and_clears() {
    let db = setup_database().await;
    let student = create_student(&db, "iris@example.com").await;
    db.profiles()
        .mark_checkout_completed(student.id, Some("sub_5"), Utc::now())
        .await
        .unwrap();

    let proc = processor(
        &db,
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    );
    let event = json!({
        "type": "customer.subscription.deleted",
        "data": { "object": { "id": "sub_5" } }
    });
    proc.process(&event).await.unwrap();

    let profile = db.profiles().get(student.id).await.unwrap().unwrap();
    assert_eq!(profile.subscription_status, SubscriptionStatus::Canceled);
    assert_eq!(profile.stripe_subscription_id, None);
}

#[tokio::test]
async fn test_subscription_updated_maps_known_statuses() {
    let db = setup_database().await;
    let student = create_student(&db, "joao@example.com").await;
    db.profiles()
        .mark_checkout_completed(student.id, Some("sub_6"), Utc::now())
        .await
        .unwrap();

    let proc = processor(
        &db,
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    );

    let event = json!({
        "type": "customer.subscription.updated",
        "data": { "object": { "id": "sub_6", "status": "past_due" } }
    });
    proc.process(&event).await.unwrap();
    let profile = db.profiles().get(student.id).await.unwrap().unwrap();
    assert_eq!(profile.subscription_status, SubscriptionStatus::PastDue);

    // Vocabulary without a local counterpart leaves the state alone
    let event = json!({
        "type": "customer.subscription.updated",
        "data": { "object": { "id": "sub_6", "status": "incomplete_expired" } }
    });
    proc.process(&event).await.unwrap();
    let profile = db.profiles().get(student.id).await.unwrap().unwrap();
    assert_eq!(profile.subscription_status, SubscriptionStatus::PastDue);
}

#[tokio::test]
async fn test_unknown_event_type_is_recorded_and_ignored() {
    let db = setup_database().await;
    let proc = processor(
        &db,
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    );

    let event = json!({ "type": "charge.refunded", "data": { "object": {} } });
    proc.process(&event).await.unwrap();

    let events = db.webhook_events().recent(10).await.unwrap();
    assert_eq!(events[0].event_type, "charge.refunded");
}

#[tokio::test]
async fn test_event_for_unknown_subscription_succeeds_quietly() {
    let db = setup_database().await;
    let proc = processor(
        &db,
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    );

    let event = json!({
        "type": "invoice.payment_failed",
        "data": { "object": { "subscription": "sub_ghost" } }
    });
    proc.process(&event).await.unwrap();
}
