//! Search/augmentation client for trending context (Perplexity-style API).

use async_trait::async_trait;
use serde::Deserialize;

/// Retrieved trending content plus its citation list.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub content: String,
    /// Newline-joined citation URLs.
    pub sources: String,
}

/// Boundary for the search/augmentation service. `None` on any failure;
/// the core substitutes empty strings.
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, query: &str) -> Option<SearchResult>;
}

/// HTTP client for Perplexity's chat endpoint, which answers a query with
/// synthesized content and a citation list.
pub struct PerplexitySearchClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl PerplexitySearchClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: "sonar".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PerplexityResponse {
    #[serde(default)]
    choices: Vec<PerplexityChoice>,
    #[serde(default)]
    citations: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PerplexityChoice {
    message: PerplexityMessage,
}

#[derive(Debug, Deserialize)]
struct PerplexityMessage {
    content: Option<String>,
}

#[async_trait]
impl SearchClient for PerplexitySearchClient {
    async fn search(&self, query: &str) -> Option<SearchResult> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": query}],
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
                tracing::error!(%error, query, "search request failed");
                return None;
            }
        };

        let parsed: PerplexityResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(error) => {
                tracing::error!(%error, query, "failed to decode search response");
                return None;
            }
        };

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)?;
        Some(SearchResult {
            content,
            sources: parsed.citations.join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn citations_default_to_empty() {
        let raw = r#"{"choices": [{"message": {"content": "news"}}]}"#;
        let parsed: PerplexityResponse = serde_json::from_str(raw).expect("should deserialize");
        assert!(parsed.citations.is_empty());
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("news"));
    }
}
