//! Configuration loading and validation.

use crate::agent::CycleKind;
use crate::error::{ConfigError, Result};
use anyhow::Context as _;
use std::path::{Path, PathBuf};

const DEFAULT_MIN_INTERVAL_MINUTES: u64 = 90;
const DEFAULT_MAX_INTERVAL_MINUTES: u64 = 180;
const DEFAULT_MAX_RECENT_TOPICS: usize = 5;
const DEFAULT_MAX_RECENT_QUERIES: usize = 7;

/// Driftbot configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Data directory path (state files and personas).
    pub data_dir: PathBuf,

    /// Posting cadence and anti-repetition windows.
    pub schedule: ScheduleConfig,

    /// Which kind of cycle to run.
    pub cycle: CycleConfig,

    /// Completion service endpoint.
    pub completion: CompletionConfig,

    /// Search/augmentation service endpoint.
    pub search: SearchConfig,

    /// Posting platform endpoint.
    pub platform: PlatformConfig,
}

/// Posting cadence and window caps.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleConfig {
    /// Minimum minutes between posts.
    pub min_interval_minutes: u64,

    /// Maximum minutes between posts.
    pub max_interval_minutes: u64,

    /// Recent-topic window cap.
    pub max_recent_topics: usize,

    /// Recent-search-query window cap.
    pub max_recent_queries: usize,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            min_interval_minutes: DEFAULT_MIN_INTERVAL_MINUTES,
            max_interval_minutes: DEFAULT_MAX_INTERVAL_MINUTES,
            max_recent_topics: DEFAULT_MAX_RECENT_TOPICS,
            max_recent_queries: DEFAULT_MAX_RECENT_QUERIES,
        }
    }
}

/// Cycle-kind selection.
#[derive(Debug, Clone, Copy)]
pub enum CycleConfig {
    Always(CycleKind),
    Alternate,
}

/// Completion service configuration.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Search service configuration. No key disables retrieval; post prompts
/// then carry empty trending context.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

/// Posting platform configuration. Without a bearer token the agent runs
/// dry: drafts are logged, never transmitted.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub base_url: String,
    pub bearer_token: Option<String>,
    /// Recent-search query used to find reply candidates.
    pub thread_query: String,
    pub dry_run: bool,
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Result<Self> {
        let data_dir = match std::env::var("DRIFTBOT_DATA_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::data_dir()
                .map(|d| d.join("driftbot"))
                .unwrap_or_else(|| PathBuf::from("./data")),
        };
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

        let schedule = ScheduleConfig {
            min_interval_minutes: env_parse(
                "DRIFTBOT_POST_INTERVAL_MIN",
                DEFAULT_MIN_INTERVAL_MINUTES,
            )?,
            max_interval_minutes: env_parse(
                "DRIFTBOT_POST_INTERVAL_MAX",
                DEFAULT_MAX_INTERVAL_MINUTES,
            )?,
            max_recent_topics: env_parse("DRIFTBOT_MAX_RECENT_TOPICS", DEFAULT_MAX_RECENT_TOPICS)?,
            max_recent_queries: env_parse(
                "DRIFTBOT_MAX_RECENT_QUERIES",
                DEFAULT_MAX_RECENT_QUERIES,
            )?,
        };
        if schedule.min_interval_minutes > schedule.max_interval_minutes {
            return Err(ConfigError::Invalid(format!(
                "DRIFTBOT_POST_INTERVAL_MIN ({}) exceeds DRIFTBOT_POST_INTERVAL_MAX ({})",
                schedule.min_interval_minutes, schedule.max_interval_minutes
            ))
            .into());
        }

        let cycle = match std::env::var("DRIFTBOT_CYCLE_KIND").as_deref() {
            Ok("post") => CycleConfig::Always(CycleKind::Post),
            Ok("alternate") => CycleConfig::Alternate,
            Ok("reply") | Err(_) => CycleConfig::Always(CycleKind::Reply),
            Ok(other) => {
                return Err(ConfigError::Invalid(format!(
                    "DRIFTBOT_CYCLE_KIND must be post, reply, or alternate, got {other}"
                ))
                .into());
            }
        };

        let completion = CompletionConfig {
            base_url: std::env::var("DRIFTBOT_LLM_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            api_key: std::env::var("LLM_API_KEY")
                .map_err(|_| ConfigError::MissingKey("LLM_API_KEY".into()))?,
        };

        let search = SearchConfig {
            base_url: std::env::var("DRIFTBOT_SEARCH_BASE_URL")
                .unwrap_or_else(|_| "https://api.perplexity.ai".into()),
            api_key: std::env::var("SEARCH_API_KEY").ok(),
        };

        let platform = PlatformConfig {
            base_url: std::env::var("DRIFTBOT_X_BASE_URL")
                .unwrap_or_else(|_| "https://api.x.com/2".into()),
            bearer_token: std::env::var("X_BEARER_TOKEN").ok(),
            thread_query: std::env::var("DRIFTBOT_THREAD_QUERY")
                .unwrap_or_else(|_| "ai agents -is:retweet lang:en".into()),
            dry_run: std::env::var("DRIFTBOT_DRY_RUN").is_ok_and(|v| v == "1" || v == "true"),
        };

        Ok(Self {
            data_dir,
            schedule,
            cycle,
            completion,
            search,
            platform,
        })
    }

    /// Path of a persona file: a `personas/` directory in the working
    /// directory wins, otherwise the data directory.
    pub fn persona_path(&self, name: &str) -> PathBuf {
        let local = Path::new("personas").join(format!("{name}.json"));
        if local.exists() {
            return local;
        }
        self.data_dir.join("personas").join(format!("{name}.json"))
    }

    /// Directory holding the persisted state slices for one persona.
    pub fn state_dir(&self, name: &str) -> PathBuf {
        self.data_dir.join("state").join(name)
    }
}

/// Read an env var and parse it, falling back to a default when unset.
fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("{key} must be a number, got {raw}")).into()),
        Err(_) => Ok(default),
    }
}
