// ABOUTME: Route-level tests for profile, evaluations, notifications, exercises, and chat
// ABOUTME: Exercises the student-facing REST surface end to end with scripted externals

#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use axum::body::Body;
use common::{bearer_token, create_coach, create_student, setup_database, test_resources, MockChat, MockGateway};
use fitflow_server::database::exercises::NewExercise;
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
async fn test_profile_get_and_update() {
    let db = setup_database().await;
    let student = create_student(&db, "perfil@example.com").await;
    let router = build_router(test_resources(
        db,
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    ));

    let updated = router
        .clone()
        .oneshot(
            Request::put("/api/profile")
                .header("authorization", bearer_token(&student))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "full_name": "Nome Novo", "phone": "+5511999999999" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(updated.status(), StatusCode::OK);
    let json = body_json(updated).await;
    assert_eq!(json["full_name"], "Nome Novo");
    assert_eq!(json["phone"], "+5511999999999");

    let fetched = router
        .oneshot(
            Request::get("/api/profile")
                .header("authorization", bearer_token(&student))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(fetched.status(), StatusCode::OK);
    assert_eq!(body_json(fetched).await["full_name"], "Nome Novo");
}

#[tokio::test]
async fn test_evaluation_creation_computes_bmi() {
    let db = setup_database().await;
    let student = create_student(&db, "medidas@example.com").await;
    let router = build_router(test_resources(
        db,
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    ));

    let response = router
        .clone()
        .oneshot(
            Request::post("/api/evaluations")
                .header("authorization", bearer_token(&student))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "weight": 80.0, "height": 180.0 }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["bmi"], 24.7);

    let listed = router
        .oneshot(
            Request::get("/api/evaluations")
                .header("authorization", bearer_token(&student))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(listed).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_anamnese_upsert_is_idempotent_per_user() {
    let db = setup_database().await;
    let student = create_student(&db, "ficha@example.com").await;
    let router = build_router(test_resources(
        db.clone(),
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    ));

    for goal in ["emagrecimento", "hipertrofia"] {
        let response = router
            .clone()
            .oneshot(
                Request::put("/api/anamnese")
                    .header("authorization", bearer_token(&student))
                    .header("content-type", "application/json")
                    .body(Body::from(json!({ "main_goal": goal }).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let anamnese = db.anamnese().get(student.id).await.unwrap().unwrap();
    assert_eq!(anamnese.main_goal.as_deref(), Some("hipertrofia"));
}

#[tokio::test]
async fn test_notification_mark_read_is_owner_scoped() {
    let db = setup_database().await;
    let owner = create_student(&db, "dona@example.com").await;
    let other = create_student(&db, "outra@example.com").await;
    let notification = db
        .notifications()
        .create(owner.id, "payment_success", "Pagamento confirmado")
        .await
        .unwrap();

    let router = build_router(test_resources(
        db.clone(),
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    ));

    let denied = router
        .clone()
        .oneshot(
            Request::post(format!("/api/notifications/{}/read", notification.id))
                .header("authorization", bearer_token(&other))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::NOT_FOUND);

    let allowed = router
        .oneshot(
            Request::post(format!("/api/notifications/{}/read", notification.id))
                .header("authorization", bearer_token(&owner))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);

    let listed = db.notifications().list(owner.id).await.unwrap();
    assert!(listed[0].read);
}

#[tokio::test]
async fn test_exercise_video_url_is_signed_and_expiring() {
    let db = setup_database().await;
    let student = create_student(&db, "video@example.com").await;
    let coach = create_coach(&db, "coach@example.com").await;
    let exercise = db
        .exercises()
        .create(
            &NewExercise {
                name: "Agachamento".into(),
                video_path: Some("videos/agachamento.mp4".into()),
                ..NewExercise::default()
            },
            Some(coach.id),
        )
        .await
        .unwrap();

    let router = build_router(test_resources(
        db,
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    ));
    let response = router
        .oneshot(
            Request::get(format!("/api/exercises/{}/video", exercise.id))
                .header("authorization", bearer_token(&student))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let url = json["url"].as_str().unwrap();
    assert!(url.contains("videos/agachamento.mp4"));
    assert!(url.contains("expires="));
    assert!(url.contains("signature="));
    assert!(json["expires_at"].as_i64().unwrap() > chrono::Utc::now().timestamp());
}

#[tokio::test]
async fn test_exercise_without_video_is_not_found() {
    let db = setup_database().await;
    let student = create_student(&db, "semvideo@example.com").await;
    let exercise = db
        .exercises()
        .create(
            &NewExercise {
                name: "Prancha".into(),
                ..NewExercise::default()
            },
            None,
        )
        .await
        .unwrap();

    let router = build_router(test_resources(
        db,
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    ));
    let response = router
        .oneshot(
            Request::get(format!("/api/exercises/{}/video", exercise.id))
                .header("authorization", bearer_token(&student))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_exercise_creation_requires_staff() {
    let db = setup_database().await;
    let student = create_student(&db, "aluno@example.com").await;

    let router = build_router(test_resources(
        db,
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    ));
    let response = router
        .oneshot(
            Request::post("/api/exercises")
                .header("authorization", bearer_token(&student))
                .header("content-type", "application/json")
                .body(Body::from(json!({ "name": "Supino" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_plan_content_hidden_until_approved() {
    let db = setup_database().await;
    let student = create_student(&db, "planos@example.com").await;
    let coach = create_coach(&db, "coach@example.com").await;
    let plan = db
        .plans()
        .create(
            student.id,
            fitflow_server::models::PlanType::Workout,
            &json!({ "titulo": "Treino A" }),
        )
        .await
        .unwrap();

    let router = build_router(test_resources(
        db.clone(),
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    ));

    let pending = router
        .clone()
        .oneshot(
            Request::get("/api/plans")
                .header("authorization", bearer_token(&student))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(pending).await;
    assert_eq!(json[0]["status"], "pending");
    assert!(json[0]["content"].is_null());

    db.plans().approve(plan.id, coach.id).await.unwrap();

    let approved = router
        .oneshot(
            Request::get("/api/plans")
                .header("authorization", bearer_token(&student))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(approved).await;
    assert_eq!(json[0]["status"], "approved");
    assert_eq!(json[0]["content"]["titulo"], "Treino A");
}

#[tokio::test]
async fn test_chat_returns_scripted_reply() {
    let db = setup_database().await;
    let student = create_student(&db, "chat@example.com").await;
    let chat = Arc::new(MockChat::with_replies(vec!["Vamos treinar!"]));

    let router = build_router(test_resources(db, Arc::new(MockGateway::default()), chat));
    let response = router
        .oneshot(
            Request::post("/api/chat")
                .header("authorization", bearer_token(&student))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "message": "Como foi meu treino?" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["reply"], "Vamos treinar!");
}

#[tokio::test]
async fn test_login_roundtrip() {
    let db = setup_database().await;
    create_student(&db, "login@example.com").await;

    let router = build_router(test_resources(
        db,
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    ));

    let ok = router
        .clone()
        .oneshot(
            Request::post("/api/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "email": "login@example.com", "password": "password123" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
    assert!(body_json(ok).await["token"].as_str().is_some());

    let bad = router
        .oneshot(
            Request::post("/api/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "email": "login@example.com", "password": "wrong-password" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_endpoint() {
    let db = setup_database().await;
    let router = build_router(test_resources(
        db,
        Arc::new(MockGateway::default()),
        Arc::new(MockChat::default()),
    ));

    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["database"], true);
}
