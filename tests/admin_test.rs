// ABOUTME: Integration tests for administrative account actions
// ABOUTME: Deletion is audited before removal; coach creation is admin-only

#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use axum::body::Body;
use common::{
    bearer_token, create_coach, create_student, setup_database, test_resources, MockChat,
    MockGateway,
};
use fitflow_server::auth::AuthManager;
use fitflow_server::database::profiles::CreateProfileRequest;
use fitflow_server::models::{Anamnese, PlanType, UserRole};
use fitflow_server::server::build_router;
use http::{Request, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

async fn create_admin(
    db: &fitflow_server::database::Database,
    email: &str,
) -> fitflow_server::models::Profile {
    db.profiles()
        .create(&CreateProfileRequest {
            email: email.to_owned(),
            password_hash: AuthManager::hash_password("password123").unwrap(),
            full_name: Some("Test Admin".into()),
            phone: None,
            role: UserRole::Admin,
            referral_code: None,
            referred_by: None,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_delete_user_writes_audit_before_removal() {
    let db = setup_database().await;
    let coach = create_coach(&db, "coach@example.com").await;
    let student = create_student(&db, "apagar@example.com").await;
    db.anamnese()
        .upsert(&Anamnese {
            user_id: student.id,
            ..Anamnese::default()
        })
        .await
        .unwrap();
    db.plans()
        .create(student.id, PlanType::Workout, &json!({}))
        .await
        .unwrap();

    let router = build_router(test_resources(
        db.clone(),
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    ));
    let body = json!({ "user_id": student.id, "reason": "solicitação do titular" });
    let response = router
        .oneshot(
            Request::post("/api/admin/users/delete")
                .header("authorization", bearer_token(&coach))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Profile and dependent rows are gone
    assert!(db.profiles().get(student.id).await.unwrap().is_none());
    assert!(db.anamnese().get(student.id).await.unwrap().is_none());
    assert!(db.plans().list_for_user(student.id).await.unwrap().is_empty());

    // The audit trail survives the deletion
    let audit = db.audit().list_for_target(student.id).await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, "delete_user");
    assert_eq!(audit[0].actor_id, Some(coach.id));
    assert_eq!(audit[0].reason.as_deref(), Some("solicitação do titular"));
    assert_eq!(audit[0].metadata["email"], "apagar@example.com");
}

#[tokio::test]
async fn test_delete_user_rejects_students() {
    let db = setup_database().await;
    let student = create_student(&db, "aluno@example.com").await;
    let victim = create_student(&db, "outro@example.com").await;

    let router = build_router(test_resources(
        db.clone(),
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    ));
    let body = json!({ "user_id": victim.id });
    let response = router
        .oneshot(
            Request::post("/api/admin/users/delete")
                .header("authorization", bearer_token(&student))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(db.profiles().get(victim.id).await.unwrap().is_some());
    assert!(db.audit().list_for_target(victim.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_unknown_user_is_not_found() {
    let db = setup_database().await;
    let coach = create_coach(&db, "coach@example.com").await;

    let router = build_router(test_resources(
        db,
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    ));
    let body = json!({ "user_id": uuid::Uuid::new_v4() });
    let response = router
        .oneshot(
            Request::post("/api/admin/users/delete")
                .header("authorization", bearer_token(&coach))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_coach_is_admin_only() {
    let db = setup_database().await;
    let admin = create_admin(&db, "admin@example.com").await;
    let coach = create_coach(&db, "coach@example.com").await;

    let router = build_router(test_resources(
        db.clone(),
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    ));

    let body = json!({ "email": "nova-coach@example.com", "password": "password123" });

    // A coach token is not enough
    let denied = router
        .clone()
        .oneshot(
            Request::post("/api/admin/coaches")
                .header("authorization", bearer_token(&coach))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let created = router
        .oneshot(
            Request::post("/api/admin/coaches")
                .header("authorization", bearer_token(&admin))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);

    let profile = db
        .profiles()
        .get_by_email("nova-coach@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.role, UserRole::Coach);
}

#[tokio::test]
async fn test_create_coach_rejects_existing_email() {
    let db = setup_database().await;
    let admin = create_admin(&db, "admin@example.com").await;
    create_student(&db, "ocupado@example.com").await;

    let router = build_router(test_resources(
        db,
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    ));
    let body = json!({ "email": "ocupado@example.com", "password": "password123" });
    let response = router
        .oneshot(
            Request::post("/api/admin/coaches")
                .header("authorization", bearer_token(&admin))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}
