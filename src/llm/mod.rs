// ABOUTME: Chat completion client for plan generation and the AI coach
// ABOUTME: Trait seam over an OpenAI-compatible HTTP API so tests can script responses
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 FitFlow

//! # LLM Integration
//!
//! A small chat-completion abstraction used by plan generation and the AI
//! coach chat endpoint. [`ChatCompletion`] is the seam; the production
//! implementation talks to any OpenAI-compatible `/chat/completions` API.

use crate::config::LlmConfig;
use crate::errors::{AppError, AppResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One message in a chat conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user`, or `assistant`
    pub role: String,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Build a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    /// Build a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    /// Build an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
        }
    }
}

/// Parameters for a chat completion call
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Conversation so far, system prompt first
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    pub temperature: f64,
    /// Response length cap
    pub max_tokens: u32,
}

impl Default for ChatRequest {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

/// Chat completion provider seam
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Run one non-streaming chat completion and return the assistant text
    async fn complete(&self, request: &ChatRequest) -> AppResult<String>;
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ChatMessage,
}

/// Production provider against an OpenAI-compatible chat completion API
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl OpenAiCompatibleProvider {
    /// Build a provider from configuration
    #[must_use]
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl ChatCompletion for OpenAiCompatibleProvider {
    async fn complete(&self, request: &ChatRequest) -> AppResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ApiRequest {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::external_service("llm", format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::external_service(
                "llm",
                format!("API returned {status}: {detail}"),
            ));
        }

        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| AppError::external_service("llm", format!("Invalid response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::external_service("llm", "Response contained no choices"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_builders() {
        let msg = ChatMessage::system("be helpful");
        assert_eq!(msg.role, "system");
        assert_eq!(ChatMessage::user("hi").role, "user");
        assert_eq!(ChatMessage::assistant("hello").role, "assistant");
    }

    #[test]
    fn test_default_request_parameters() {
        let req = ChatRequest::default();
        assert!((req.temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(req.max_tokens, 2000);
    }
}
