// ABOUTME: Integration tests for LLM-backed plan generation
// ABOUTME: Covers the two-plan flow, JSON extraction, and the raw-text fallback

#![allow(missing_docs, clippy::unwrap_used)]

mod common;

use common::{create_student, setup_database, MockChat};
use fitflow_server::database::evaluations::NewEvaluation;
use fitflow_server::database::Database;
use fitflow_server::models::{Anamnese, PlanReviewStatus, PlanType};
use fitflow_server::plans::generator::PlanGenerator;
use std::sync::Arc;
use uuid::Uuid;

async fn onboard(db: &Database, user_id: Uuid) {
    db.anamnese()
        .upsert(&Anamnese {
            user_id,
            main_goal: Some("hipertrofia".into()),
            diet_preference: Some("vegetariana".into()),
            ..Anamnese::default()
        })
        .await
        .unwrap();
    db.evaluations()
        .create(
            user_id,
            &NewEvaluation {
                weight: Some(70.0),
                height: Some(175.0),
                ..NewEvaluation::default()
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_generates_workout_and_nutrition_plans_pending_review() {
    let db = setup_database().await;
    let student = create_student(&db, "gen@example.com").await;
    onboard(&db, student.id).await;

    let chat = Arc::new(MockChat::with_replies(vec![
        r#"{"titulo": "Treino ABC", "dias": [{"dia": "Segunda", "foco": "Peito"}]}"#,
        r#"{"titulo": "Plano Alimentar", "calorias_diarias": 2400}"#,
    ]));
    let generator = PlanGenerator::new(
        db.clone(),
        Arc::clone(&chat) as Arc<dyn fitflow_server::llm::ChatCompletion>,
    );

    generator.generate_for_user(student.id).await.unwrap();

    let plans = db.plans().list_for_user(student.id).await.unwrap();
    assert_eq!(plans.len(), 2);
    assert!(plans.iter().all(|p| p.status == PlanReviewStatus::Pending));

    let workout = plans
        .iter()
        .find(|p| p.plan_type == PlanType::Workout)
        .unwrap();
    assert_eq!(workout.content["titulo"], "Treino ABC");

    let nutrition = plans
        .iter()
        .find(|p| p.plan_type == PlanType::Nutrition)
        .unwrap();
    assert_eq!(nutrition.content["calorias_diarias"], 2400);

    let notifications = db.notifications().list(student.id).await.unwrap();
    assert!(notifications
        .iter()
        .any(|n| n.notification_type == "plan_generation"));
}

#[tokio::test]
async fn test_json_extracted_from_fenced_response() {
    let db = setup_database().await;
    let student = create_student(&db, "fence@example.com").await;
    onboard(&db, student.id).await;

    let chat = Arc::new(MockChat::with_replies(vec![
        "Claro! Aqui está:\n```json\n{\"titulo\": \"Treino X\"}\n```",
        "```json\n{\"titulo\": \"Dieta X\"}\n```",
    ]));
    let generator = PlanGenerator::new(db.clone(), chat);

    generator.generate_for_user(student.id).await.unwrap();

    let plans = db.plans().list_for_user(student.id).await.unwrap();
    assert!(plans.iter().any(|p| p.content["titulo"] == "Treino X"));
    assert!(plans.iter().any(|p| p.content["titulo"] == "Dieta X"));
}

#[tokio::test]
async fn test_unparseable_response_stored_for_manual_review() {
    let db = setup_database().await;
    let student = create_student(&db, "raw@example.com").await;
    onboard(&db, student.id).await;

    let chat = Arc::new(MockChat::with_replies(vec![
        "Não consegui montar o plano em JSON.",
        r#"{"titulo": "Dieta OK"}"#,
    ]));
    let generator = PlanGenerator::new(db.clone(), chat);

    generator.generate_for_user(student.id).await.unwrap();

    let plans = db.plans().list_for_user(student.id).await.unwrap();
    let workout = plans
        .iter()
        .find(|p| p.plan_type == PlanType::Workout)
        .unwrap();
    assert_eq!(
        workout.content["observacoes"],
        "Não consegui montar o plano em JSON."
    );
}

#[tokio::test]
async fn test_generation_requires_onboarding_data() {
    let db = setup_database().await;
    let student = create_student(&db, "bare@example.com").await;

    let generator = PlanGenerator::new(db.clone(), Arc::new(MockChat::default()));
    assert!(generator.generate_for_user(student.id).await.is_err());
    assert!(db.plans().list_for_user(student.id).await.unwrap().is_empty());
}
