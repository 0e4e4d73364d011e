// ABOUTME: Integration tests for referral signup linking and activation accounting
// ABOUTME: Covers the signup route, one-shot activation, and the coach overview

#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use axum::body::Body;
use common::{bearer_token, create_student, setup_database, test_resources, MockChat, MockGateway};
use fitflow_server::server::build_router;
use http::{Request, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_signup_with_referral_code_links_accounts() {
    let db = setup_database().await;
    let referrer = create_student(&db, "indicador@example.com").await;
    let code = referrer.referral_code.clone().unwrap();

    let router = build_router(test_resources(
        db.clone(),
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    ));
    let body = json!({
        "email": "novo@example.com",
        "password": "password123",
        "full_name": "Novo Aluno",
        "referral_code": code,
    });
    let response = router
        .oneshot(
            Request::post("/api/auth/signup")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert!(json["token"].as_str().is_some());
    assert_eq!(json["profile"]["referred_by"], referrer.id.to_string());
    // Password hash never leaves the server
    assert!(json["profile"].get("password_hash").is_none());

    let referrals = db.referrals().list_for_referrer(referrer.id).await.unwrap();
    assert_eq!(referrals.len(), 1);
    assert_eq!(referrals[0].status, "pending");
    assert!(!referrals[0].discount_applied);
}

#[tokio::test]
async fn test_signup_with_unknown_code_still_succeeds_unlinked() {
    let db = setup_database().await;
    let router = build_router(test_resources(
        db.clone(),
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    ));

    let body = json!({
        "email": "solo@example.com",
        "password": "password123",
        "referral_code": "DOESNOTEXIST",
    });
    let response = router
        .oneshot(
            Request::post("/api/auth/signup")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert!(json["profile"]["referred_by"].is_null());
}

#[tokio::test]
async fn test_duplicate_email_signup_rejected() {
    let db = setup_database().await;
    create_student(&db, "taken@example.com").await;

    let router = build_router(test_resources(
        db,
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    ));
    let body = json!({ "email": "taken@example.com", "password": "password123" });
    let response = router
        .oneshot(
            Request::post("/api/auth/signup")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_activation_is_one_shot() {
    let db = setup_database().await;
    let referrer = create_student(&db, "indicador@example.com").await;
    let referred = create_student(&db, "indicado@example.com").await;
    db.referrals().create(referrer.id, referred.id).await.unwrap();

    let first = db
        .referrals()
        .activate_for_referred(referred.id)
        .await
        .unwrap();
    assert!(first.is_some());
    assert_eq!(first.unwrap().status, "active");

    // Already-activated rows are not returned again
    let second = db
        .referrals()
        .activate_for_referred(referred.id)
        .await
        .unwrap();
    assert!(second.is_none());
}

#[tokio::test]
async fn test_referral_summary_route() {
    let db = setup_database().await;
    let referrer = create_student(&db, "indicador@example.com").await;
    let referred = create_student(&db, "indicado@example.com").await;
    db.referrals().create(referrer.id, referred.id).await.unwrap();
    db.profiles().increment_discount(referrer.id).await.unwrap();

    let router = build_router(test_resources(
        db,
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    ));
    let response = router
        .oneshot(
            Request::get("/api/referrals")
                .header("authorization", bearer_token(&referrer))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["discount_remaining"], 1);
    assert_eq!(json["referrals"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_coach_referral_overview_requires_staff() {
    let db = setup_database().await;
    let student = create_student(&db, "aluno@example.com").await;
    let coach = common::create_coach(&db, "coach@example.com").await;
    let referred = create_student(&db, "indicado@example.com").await;
    db.referrals().create(student.id, referred.id).await.unwrap();

    let router = build_router(test_resources(
        db,
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    ));

    let denied = router
        .clone()
        .oneshot(
            Request::get("/api/coach/referrals")
                .header("authorization", bearer_token(&student))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let allowed = router
        .oneshot(
            Request::get("/api/coach/referrals")
                .header("authorization", bearer_token(&coach))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);
    let json = body_json(allowed).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert!(json[0]["referrer_name"].as_str().is_some());
}
