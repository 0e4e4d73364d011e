// ABOUTME: Route handler for the AI coach chat endpoint
// ABOUTME: Builds a personalized system prompt from the student's profile and intake data
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::errors::AppError;
use crate::llm::{ChatMessage, ChatRequest};
use crate::models::{Anamnese, Profile};
use crate::resources::ServerResources;
use crate::routes::bearer_auth;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Maximum prior messages replayed into the model context
const MAX_HISTORY_MESSAGES: usize = 20;

/// Chat request body
#[derive(Debug, Deserialize)]
pub struct ChatBody {
    /// The user's new message
    pub message: String,
    /// Prior conversation turns, oldest first
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

/// Chat response body
#[derive(Debug, Serialize)]
pub struct ChatResponseBody {
    /// Assistant reply text
    pub reply: String,
}

/// Build the coach persona prompt from whatever student data exists
fn build_system_prompt(profile: &Profile, anamnese: Option<&Anamnese>) -> String {
    let mut prompt = String::from(
        "Você é um coach de fitness da FitFlow. Responda em português, de forma \
         motivadora e objetiva. Não prescreva medicamentos nem diagnósticos médicos.",
    );
    if let Some(name) = &profile.full_name {
        prompt.push_str(&format!(" O aluno se chama {name}."));
    }
    if let Some(anamnese) = anamnese {
        if let Some(goal) = &anamnese.main_goal {
            prompt.push_str(&format!(" Objetivo principal do aluno: {goal}."));
        }
        if let Some(level) = &anamnese.activity_level {
            prompt.push_str(&format!(" Nível de atividade: {level}."));
        }
        if let Some(injuries) = &anamnese.injuries {
            prompt.push_str(&format!(" Lesões conhecidas: {injuries}."));
        }
        if anamnese.diabetes || anamnese.hypertension || anamnese.cardiovascular {
            prompt.push_str(
                " O aluno tem condições de saúde registradas; recomende acompanhamento médico \
                 quando relevante.",
            );
        }
    }
    prompt
}

/// AI coach chat routes handler
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create all chat routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/chat", post(Self::handle_chat))
            .with_state(resources)
    }

    /// Handle POST /api/chat - One AI coach exchange
    async fn handle_chat(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<ChatBody>,
    ) -> Result<Response, AppError> {
        let auth = bearer_auth(&headers, &resources)?;

        if body.message.trim().is_empty() {
            return Err(AppError::missing_field("message"));
        }

        let profile = resources
            .database
            .profiles()
            .get(auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Profile {}", auth.user_id)))?;
        let anamnese = resources.database.anamnese().get(auth.user_id).await?;

        let mut messages = vec![ChatMessage::system(build_system_prompt(
            &profile,
            anamnese.as_ref(),
        ))];
        let history_start = body.history.len().saturating_sub(MAX_HISTORY_MESSAGES);
        messages.extend(body.history.into_iter().skip(history_start));
        messages.push(ChatMessage::user(body.message));

        let request = ChatRequest {
            messages,
            ..ChatRequest::default()
        };
        let reply = resources.chat.complete(&request).await?;

        Ok((StatusCode::OK, Json(ChatResponseBody { reply })).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SubscriptionStatus, UserRole};
    use chrono::Utc;
    use uuid::Uuid;

    fn test_profile() -> Profile {
        Profile {
            id: Uuid::new_v4(),
            email: "aluno@example.com".into(),
            password_hash: String::new(),
            full_name: Some("Maria".into()),
            phone: None,
            role: UserRole::Student,
            avatar_url: None,
            subscription_status: SubscriptionStatus::Active,
            plan_status: None,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            current_period_end: None,
            discount_remaining: 0,
            referral_code: None,
            referred_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_system_prompt_includes_student_context() {
        let anamnese = Anamnese {
            main_goal: Some("hipertrofia".into()),
            injuries: Some("joelho direito".into()),
            hypertension: true,
            ..Anamnese::default()
        };
        let prompt = build_system_prompt(&test_profile(), Some(&anamnese));

        assert!(prompt.contains("Maria"));
        assert!(prompt.contains("hipertrofia"));
        assert!(prompt.contains("joelho direito"));
        assert!(prompt.contains("acompanhamento médico"));
    }

    #[test]
    fn test_system_prompt_without_anamnese() {
        let prompt = build_system_prompt(&test_profile(), None);
        assert!(prompt.contains("coach de fitness"));
    }
}
