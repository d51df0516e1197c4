//! OpenAiChatModel - REST client for OpenAI-compatible chat completion APIs.
//!
//! Consulted only when the grammar understands nothing; the reply is either
//! shown to the guest or, when it carries an itemized order, run back
//! through the extractor.

use async_trait::async_trait;
use galley_core::config::LlmConfig;
use galley_core::error::{GalleyError, Result};
use galley_core::llm::LanguageModel;
use galley_core::session::{Turn, TurnRole};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// [`LanguageModel`] backed by a `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiChatModel {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: Option<u32>,
}

impl OpenAiChatModel {
    /// Creates a model client for `base_url` (e.g. `https://api.openai.com/v1`).
    pub fn new(
        base_url: impl AsRef<str>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/chat/completions", base_url.as_ref().trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: None,
        }
    }

    /// Builds a client from configuration, reading the API key from the
    /// environment variable named in `config.api_key_env`.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = env::var(&config.api_key_env).map_err(|_| {
            GalleyError::config(format!(
                "{} not found in environment variables",
                config.api_key_env
            ))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| GalleyError::LanguageModel(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_tokens: config.max_tokens,
            ..Self::new(&config.base_url, api_key, &config.model)
        })
    }

    /// Sets the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn build_request(&self, system_prompt: &str, turns: &[Turn]) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(turns.len() + 1);
        messages.push(ChatMessage {
            role: "system",
            content: system_prompt.to_string(),
        });
        messages.extend(turns.iter().map(|turn| ChatMessage {
            role: role_name(turn.role),
            content: turn.text.clone(),
        }));

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
        }
    }

    async fn send_request(&self, body: &ChatCompletionRequest) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| {
                GalleyError::LanguageModel(format!("Chat completion request failed: {err}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|err| {
            GalleyError::LanguageModel(format!("Failed to parse chat completion response: {err}"))
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatModel {
    async fn complete(&self, system_prompt: &str, turns: &[Turn]) -> Result<String> {
        let request = self.build_request(system_prompt, turns);
        tracing::debug!(
            "[OpenAiChatModel] requesting completion ({} messages, model {})",
            request.messages.len(),
            request.model
        );
        self.send_request(&request).await
    }
}

fn role_name(role: TurnRole) -> &'static str {
    match role {
        TurnRole::User => "user",
        TurnRole::Assistant => "assistant",
        TurnRole::System => "system",
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_text_response(response: ChatCompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| GalleyError::LanguageModel("response contained no content".into()))
}

fn map_http_error(status: StatusCode, body: String) -> GalleyError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);
    GalleyError::LanguageModel(format!("HTTP {}: {message}", status.as_u16()))
}
