//! Candidate-thread source for reply cycles (X API v2 recent search).

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

/// A trending post the agent may reply to, with platform engagement counters.
#[derive(Debug, Clone, Default)]
pub struct ThreadCandidate {
    pub id: String,
    pub username: String,
    pub text: String,
    pub retweet_count: u64,
    pub reply_count: u64,
    pub like_count: u64,
    pub quote_count: u64,
    pub bookmark_count: u64,
    pub impression_count: u64,
}

impl ThreadCandidate {
    /// Composite engagement score used to rank reply candidates.
    pub fn engagement_score(&self) -> u64 {
        self.retweet_count
            + self.reply_count
            + self.like_count
            + self.quote_count
            + self.bookmark_count
            + self.impression_count
    }

    /// Canonical URL of the post.
    pub fn url(&self) -> String {
        format!("https://x.com/{}/status/{}", self.username, self.id)
    }
}

/// Boundary for the candidate-thread source. May return an empty list;
/// implementations log their own failures.
#[async_trait]
pub trait ThreadSource: Send + Sync {
    async fn search(&self) -> Vec<ThreadCandidate>;
}

/// HTTP client for the X API v2 recent tweet search.
pub struct XThreadSource {
    http: reqwest::Client,
    base_url: String,
    bearer_token: String,
    query: String,
}

impl XThreadSource {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        bearer_token: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            bearer_token: bearer_token.into(),
            query: query.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RecentSearchResponse {
    #[serde(default)]
    data: Vec<Tweet>,
    #[serde(default)]
    includes: Includes,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
    text: String,
    author_id: Option<String>,
    #[serde(default)]
    public_metrics: PublicMetrics,
}

#[derive(Debug, Default, Deserialize)]
struct PublicMetrics {
    #[serde(default)]
    retweet_count: u64,
    #[serde(default)]
    reply_count: u64,
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    quote_count: u64,
    #[serde(default)]
    bookmark_count: u64,
    #[serde(default)]
    impression_count: u64,
}

#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<User>,
}

#[derive(Debug, Deserialize)]
struct User {
    id: String,
    username: String,
}

impl RecentSearchResponse {
    /// Flatten into candidates, preserving the API's arrival order.
    fn into_candidates(self) -> Vec<ThreadCandidate> {
        let usernames: HashMap<String, String> = self
            .includes
            .users
            .into_iter()
            .map(|user| (user.id, user.username))
            .collect();

        self.data
            .into_iter()
            .map(|tweet| {
                let username = tweet
                    .author_id
                    .as_ref()
                    .and_then(|id| usernames.get(id))
                    .cloned()
                    .unwrap_or_else(|| "user".to_string());
                ThreadCandidate {
                    id: tweet.id,
                    username,
                    text: tweet.text,
                    retweet_count: tweet.public_metrics.retweet_count,
                    reply_count: tweet.public_metrics.reply_count,
                    like_count: tweet.public_metrics.like_count,
                    quote_count: tweet.public_metrics.quote_count,
                    bookmark_count: tweet.public_metrics.bookmark_count,
                    impression_count: tweet.public_metrics.impression_count,
                }
            })
            .collect()
    }
}

#[async_trait]
impl ThreadSource for XThreadSource {
    async fn search(&self) -> Vec<ThreadCandidate> {
        let url = format!("{}/tweets/search/recent", self.base_url.trim_end_matches('/'));
        let response = match self
            .http
            .get(&url)
            .bearer_auth(&self.bearer_token)
            .query(&[
                ("query", self.query.as_str()),
                ("tweet.fields", "public_metrics,author_id"),
                ("expansions", "author_id"),
                ("user.fields", "username"),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
        {
            Ok(response) => response,
            Err(error) => {
                tracing::error!(%error, query = %self.query, "thread search failed");
                return Vec::new();
            }
        };

        match response.json::<RecentSearchResponse>().await {
            Ok(parsed) => parsed.into_candidates(),
            Err(error) => {
                tracing::error!(%error, "failed to decode thread search response");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn candidates_resolve_usernames_and_keep_order() {
        let raw = indoc! {r#"
            {
                "data": [
                    {"id": "1", "text": "first", "author_id": "u1",
                     "public_metrics": {"retweet_count": 1, "like_count": 2}},
                    {"id": "2", "text": "second", "author_id": "u9"}
                ],
                "includes": {"users": [{"id": "u1", "username": "alice"}]}
            }
        "#};
        let parsed: RecentSearchResponse = serde_json::from_str(raw).expect("should deserialize");
        let candidates = parsed.into_candidates();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].username, "alice");
        assert_eq!(candidates[0].engagement_score(), 3);
        assert_eq!(candidates[0].url(), "https://x.com/alice/status/1");
        // Unknown author falls back rather than dropping the candidate.
        assert_eq!(candidates[1].username, "user");
        assert_eq!(candidates[1].engagement_score(), 0);
    }

    #[test]
    fn empty_response_yields_no_candidates() {
        let parsed: RecentSearchResponse = serde_json::from_str("{}").expect("should deserialize");
        assert!(parsed.into_candidates().is_empty());
    }
}
