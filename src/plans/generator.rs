// ABOUTME: LLM-driven workout and nutrition plan drafting
// ABOUTME: Builds prompts from intake data, extracts JSON, and stores plans pending review
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::llm::{ChatCompletion, ChatMessage, ChatRequest};
use crate::models::{Anamnese, Evaluation, PlanType, Profile};
use regex::Regex;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Drafts workout and nutrition plans for a student and stores them in
/// `pending` status for coach review.
pub struct PlanGenerator {
    database: Database,
    chat: Arc<dyn ChatCompletion>,
}

impl PlanGenerator {
    /// Create a new plan generator
    #[must_use]
    pub fn new(database: Database, chat: Arc<dyn ChatCompletion>) -> Self {
        Self { database, chat }
    }

    /// Generate both plan documents for a student.
    ///
    /// The workout and nutrition calls run sequentially. A response that
    /// is not parseable JSON still produces a plan, with the raw text
    /// preserved for the coach under `observacoes`.
    ///
    /// # Errors
    ///
    /// Returns an error when the student is missing onboarding data or a
    /// completion call fails.
    pub async fn generate_for_user(&self, user_id: Uuid) -> AppResult<()> {
        let profile = self
            .database
            .profiles()
            .get(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Profile {user_id}")))?;
        let anamnese = self
            .database
            .anamnese()
            .get(user_id)
            .await?
            .ok_or_else(|| AppError::invalid_input("Student has not completed the intake questionnaire"))?;
        let evaluation = self
            .database
            .evaluations()
            .latest(user_id)
            .await?
            .ok_or_else(|| AppError::invalid_input("Student has no physical evaluation on record"))?;

        let workout_prompt = build_workout_prompt(&profile, &anamnese, &evaluation);
        let workout_raw = self.complete(&workout_prompt).await?;
        let workout_content = extract_plan_json(&workout_raw);
        self.database
            .plans()
            .create(user_id, PlanType::Workout, &workout_content)
            .await?;
        info!("Stored pending workout plan for {user_id}");

        let nutrition_prompt = build_nutrition_prompt(&profile, &anamnese, &evaluation);
        let nutrition_raw = self.complete(&nutrition_prompt).await?;
        let nutrition_content = extract_plan_json(&nutrition_raw);
        self.database
            .plans()
            .create(user_id, PlanType::Nutrition, &nutrition_content)
            .await?;
        info!("Stored pending nutrition plan for {user_id}");

        self.database
            .notifications()
            .create(
                user_id,
                "plan_generation",
                "Seus planos foram gerados e estão em análise pelo seu coach.",
            )
            .await?;

        Ok(())
    }

    async fn complete(&self, prompt: &str) -> AppResult<String> {
        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(
                    "Você é um personal trainer e nutricionista experiente. \
                     Responda APENAS com um objeto JSON válido, sem texto adicional.",
                ),
                ChatMessage::user(prompt),
            ],
            ..ChatRequest::default()
        };
        self.chat.complete(&request).await
    }
}

/// Pull the first JSON object out of a completion response.
///
/// Models occasionally wrap the document in prose or code fences; the
/// widest brace-to-brace span is tried first. When nothing parses, the
/// raw text is preserved in a fallback document so the coach can still
/// review and edit it.
#[must_use]
pub fn extract_plan_json(raw: &str) -> serde_json::Value {
    if let Ok(brace_span) = Regex::new(r"(?s)\{.*\}") {
        if let Some(m) = brace_span.find(raw) {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(m.as_str()) {
                return value;
            }
        }
    }

    warn!("Completion was not parseable JSON, storing raw text for manual review");
    serde_json::json!({
        "titulo": "Plano gerado (requer revisão manual)",
        "observacoes": raw,
    })
}

fn describe_student(profile: &Profile, anamnese: &Anamnese, evaluation: &Evaluation) -> String {
    let mut lines = Vec::new();
    if let Some(name) = &profile.full_name {
        lines.push(format!("Nome: {name}"));
    }
    if let Some(goal) = &anamnese.main_goal {
        lines.push(format!("Objetivo principal: {goal}"));
    }
    if let Some(level) = &anamnese.activity_level {
        lines.push(format!("Nível de atividade: {level}"));
    }
    if let Some(gender) = &anamnese.gender {
        lines.push(format!("Gênero: {gender}"));
    }
    if let Some(birth) = anamnese.birth_date {
        lines.push(format!("Data de nascimento: {birth}"));
    }
    if let Some(weight) = evaluation.weight {
        lines.push(format!("Peso atual: {weight} kg"));
    }
    if let Some(height) = evaluation.height.or(anamnese.height) {
        lines.push(format!("Altura: {height} cm"));
    }
    if let Some(bmi) = evaluation.bmi {
        lines.push(format!("IMC: {bmi}"));
    }
    if let Some(target) = anamnese.target_weight {
        lines.push(format!("Peso alvo: {target} kg"));
    }
    if let Some(injuries) = &anamnese.injuries {
        lines.push(format!("Lesões: {injuries}"));
    }
    if anamnese.diabetes {
        lines.push("Condição: diabetes".into());
    }
    if anamnese.hypertension {
        lines.push("Condição: hipertensão".into());
    }
    if anamnese.cardiovascular {
        lines.push("Condição: cardiovascular".into());
    }
    lines.join("\n")
}

fn build_workout_prompt(profile: &Profile, anamnese: &Anamnese, evaluation: &Evaluation) -> String {
    let mut prompt = format!(
        "Crie um plano de treino semanal personalizado para o seguinte aluno:\n\n{}\n",
        describe_student(profile, anamnese, evaluation)
    );
    if let Some(duration) = &anamnese.training_duration {
        prompt.push_str(&format!("Duração preferida do treino: {duration}\n"));
    }
    if let Some(availability) = &anamnese.availability {
        prompt.push_str(&format!("Disponibilidade semanal: {availability}\n"));
    }
    prompt.push_str(
        "\nResponda com um objeto JSON com esta estrutura: \
         {\"titulo\": string, \"dias\": [{\"dia\": string, \"foco\": string, \
         \"exercicios\": [{\"nome\": string, \"series\": number, \"repeticoes\": string, \
         \"descanso\": string}]}], \"observacoes\": string}",
    );
    prompt
}

fn build_nutrition_prompt(profile: &Profile, anamnese: &Anamnese, evaluation: &Evaluation) -> String {
    let mut prompt = format!(
        "Crie um plano alimentar semanal personalizado para o seguinte aluno:\n\n{}\n",
        describe_student(profile, anamnese, evaluation)
    );
    if let Some(diet) = &anamnese.diet_preference {
        prompt.push_str(&format!("Preferência alimentar: {diet}\n"));
    }
    if let Some(intolerances) = &anamnese.intolerances {
        prompt.push_str(&format!("Intolerâncias: {intolerances}\n"));
    }
    if let Some(allergies) = &anamnese.allergies {
        prompt.push_str(&format!("Alergias: {allergies}\n"));
    }
    if let Some(meals) = &anamnese.meals_per_day {
        prompt.push_str(&format!("Refeições por dia: {meals}\n"));
    }
    prompt.push_str(
        "\nResponda com um objeto JSON com esta estrutura: \
         {\"titulo\": string, \"calorias_diarias\": number, \"refeicoes\": [{\"nome\": string, \
         \"horario\": string, \"alimentos\": [{\"alimento\": string, \"quantidade\": string}]}], \
         \"observacoes\": string}",
    );
    prompt
}
