//! Persona loading and validation.
//!
//! A persona is a JSON character file describing the agent's voice: bio and
//! lore excerpts, topics it cares about, style directions, and the search
//! query catalog used to find trending context. Personas are immutable after
//! load; every cycle reads from the same snapshot.

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Fields that must be present and non-empty in a persona file.
const REQUIRED_FIELDS: [&str; 10] = [
    "name",
    "settings",
    "system",
    "bio",
    "lore",
    "adjectives",
    "topics",
    "style",
    "knowledge",
    "search_queries",
];

/// A loaded persona character file.
#[derive(Debug, Clone, Deserialize)]
pub struct Persona {
    pub name: String,
    pub settings: HashMap<String, Value>,
    /// The system prompt sent with every completion request.
    pub system: String,
    pub bio: Vec<String>,
    pub lore: Vec<String>,
    pub adjectives: Vec<String>,
    pub topics: Vec<String>,
    /// Style directions keyed by context ("all", "post", ...).
    pub style: HashMap<String, Vec<String>>,
    pub knowledge: Vec<String>,
    /// Search query strings grouped by topic category.
    pub search_queries: HashMap<String, Vec<String>>,
    /// Unrecognized fields, preserved opaquely.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl Persona {
    /// Load and validate a persona file.
    pub async fn load(path: &Path) -> Result<Arc<Self>> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Load {
                path: path.display().to_string(),
                source: Arc::new(source),
            })?;

        let value: Value = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        let missing: Vec<&str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| is_missing(value.get(*field)))
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingPersonaFields(missing.join(", ")).into());
        }

        let persona: Persona =
            serde_json::from_value(value).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;

        Ok(Arc::new(persona))
    }

    /// The platform handle, read from the opaque extra fields.
    /// Falls back to "user" when the persona carries no profile.
    pub fn handle(&self) -> &str {
        self.extra
            .get("twitter_profile")
            .and_then(|profile| profile.get("username"))
            .and_then(Value::as_str)
            .unwrap_or("user")
    }

    /// The completion model from settings, defaulting to gpt-4o.
    pub fn model(&self) -> &str {
        self.settings
            .get("model")
            .and_then(Value::as_str)
            .unwrap_or("gpt-4o")
    }

    /// Whether the persona requests debug logging.
    pub fn debug(&self) -> bool {
        self.settings
            .get("debug")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// A field counts as missing when absent, null, or empty.
fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const FULL_PERSONA: &str = indoc! {r#"
        {
            "name": "daige",
            "settings": {"model": "gpt-4o", "debug": true},
            "system": "You are daige.",
            "bio": ["an agent", "watches markets"],
            "lore": ["born in a datacenter"],
            "adjectives": ["terse"],
            "topics": ["ai", "crypto"],
            "style": {"all": ["be brief"], "post": ["no hashtags"]},
            "knowledge": ["transformers", "mev"],
            "search_queries": {"ai": ["latest ai news"]},
            "twitter_profile": {"username": "daige_ai"}
        }
    "#};

    async fn write_persona(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("persona.json");
        tokio::fs::write(&path, contents)
            .await
            .expect("persona fixture should be written");
        (dir, path)
    }

    #[tokio::test]
    async fn loads_full_persona_with_extra_fields() {
        let (_dir, path) = write_persona(FULL_PERSONA).await;
        let persona = Persona::load(&path).await.expect("persona should load");

        assert_eq!(persona.name, "daige");
        assert_eq!(persona.handle(), "daige_ai");
        assert_eq!(persona.model(), "gpt-4o");
        assert!(persona.debug());
        assert!(persona.extra.contains_key("twitter_profile"));
    }

    #[tokio::test]
    async fn missing_fields_are_all_reported() {
        let (_dir, path) = write_persona(r#"{"name": "x", "topics": []}"#).await;
        let error = Persona::load(&path).await.expect_err("load should fail");

        let message = error.to_string();
        assert!(message.contains("missing required fields"));
        // Empty arrays count as missing, and every absent field is listed.
        assert!(message.contains("topics"));
        assert!(message.contains("system"));
        assert!(message.contains("search_queries"));
        assert!(!message.contains("name,"));
    }

    #[tokio::test]
    async fn handle_falls_back_without_profile() {
        let stripped = FULL_PERSONA.replace("twitter_profile", "other_profile");
        let (_dir, path) = write_persona(&stripped).await;
        let persona = Persona::load(&path).await.expect("persona should load");
        assert_eq!(persona.handle(), "user");
    }

    #[tokio::test]
    async fn missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let error = Persona::load(&dir.path().join("nope.json"))
            .await
            .expect_err("load should fail");
        assert!(error.to_string().contains("failed to load persona"));
    }
}
