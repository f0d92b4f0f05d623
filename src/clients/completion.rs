//! Completion service client (OpenAI-compatible chat endpoint).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One message in a completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// A successful completion.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
}

/// Boundary for the language-model completion service. Implementations log
/// their own failures; `None` covers both transport errors and responses
/// with no usable content.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Option<Completion>;
}

/// HTTP client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiCompletionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiCompletionClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Option<Completion> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": model,
            "messages": messages,
        });

        let response = match self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
        {
            Ok(response) => response,
            Err(error) => {
                tracing::error!(%error, model, "completion request failed");
                return None;
            }
        };

        let parsed: ChatResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(error) => {
                tracing::error!(%error, model, "failed to decode completion response");
                return None;
            }
        };

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .map(|content| Completion { content })
    }
}
