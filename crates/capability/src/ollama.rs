//! Ollama chat client.
//!
//! Sends a single non-streaming `POST /api/chat` request and returns the
//! assistant message content untouched. Callers decide how to trim or
//! fall back.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::generator::{GenerationError, TextGenerator};
use crate::http::check_status;

/// HTTP client for one Ollama server and model.
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: String,
}

impl OllamaClient {
    /// * `base_url` - e.g. `http://127.0.0.1:11434`.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, instruction: &str) -> Result<String, GenerationError> {
        let body = build_chat_request(&self.model, instruction);

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let body: serde_json::Value = response.json().await?;
        extract_content(body)
    }
}

impl OllamaClient {
    /// Non-2xx replies become [`GenerationError::Api`] with Ollama's error
    /// text, e.g. `{"error":"model not found"}`.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GenerationError> {
        check_status(response)
            .await
            .map_err(|(status, body)| GenerationError::Api { status, body })
    }
}

impl TextGenerator for OllamaClient {
    async fn generate(&self, instruction: &str) -> Result<String, GenerationError> {
        tracing::debug!(model = %self.model, "Sending chat request to Ollama");
        self.chat(instruction).await
    }
}

fn build_chat_request<'a>(model: &'a str, instruction: &'a str) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content: instruction,
        }],
        stream: false,
    }
}

/// Pull `message.content` out of a chat response body.
fn extract_content(body: serde_json::Value) -> Result<String, GenerationError> {
    let parsed: ChatResponse = serde_json::from_value(body)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;
    parsed
        .message
        .map(|m| m.content)
        .ok_or_else(|| GenerationError::MalformedResponse("response has no message".into()))
}
