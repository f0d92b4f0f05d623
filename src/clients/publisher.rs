//! Publishing to the posting platform, plus a dry-run short circuit.

use async_trait::async_trait;
use serde::Deserialize;

/// Boundary for the posting service. Returns the platform-assigned id on a
/// confirmed publish; `None` means the publish failed or was a dry run, and
/// nothing must be recorded.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, text: &str) -> Option<String>;
}

/// HTTP client for X API v2 `POST /tweets`.
pub struct XPublisher {
    http: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

impl XPublisher {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        bearer_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            bearer_token: bearer_token.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    data: Option<PublishData>,
}

#[derive(Debug, Deserialize)]
struct PublishData {
    id: String,
}

#[async_trait]
impl Publisher for XPublisher {
    async fn publish(&self, text: &str) -> Option<String> {
        let url = format!("{}/tweets", self.base_url.trim_end_matches('/'));
        let response = match self
            .http
            .post(&url)
            .bearer_auth(&self.bearer_token)
            .json(&serde_json::json!({"text": text}))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
        {
            Ok(response) => response,
            Err(error) => {
                tracing::error!(%error, "publish request failed");
                return None;
            }
        };

        let parsed: PublishResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(error) => {
                tracing::error!(%error, "failed to decode publish response");
                return None;
            }
        };

        parsed
            .data
            .map(|data| data.id)
            .filter(|id| !id.is_empty())
    }
}

/// Publisher that logs the would-be post instead of transmitting it.
/// Reports success without an id, so no state is recorded.
#[derive(Debug, Default)]
pub struct DryRunPublisher;

#[async_trait]
impl Publisher for DryRunPublisher {
    async fn publish(&self, text: &str) -> Option<String> {
        tracing::info!(text, "dry run: would have published");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dry_run_never_returns_an_id() {
        assert_eq!(DryRunPublisher.publish("hello").await, None);
    }

    #[test]
    fn publish_response_id_deserializes() {
        let raw = r#"{"data": {"id": "123", "text": "hello"}}"#;
        let parsed: PublishResponse = serde_json::from_str(raw).expect("should deserialize");
        assert_eq!(parsed.data.map(|d| d.id).as_deref(), Some("123"));
    }
}
