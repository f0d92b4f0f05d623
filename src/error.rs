//! Top-level error types for Driftbot.

use std::sync::Arc;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error enum wrapping domain-specific errors. Cycle and
/// selection failures never bubble this high: the scheduler logs them and
/// keeps looping, so only startup failures flow through here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration and persona loading errors. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load persona from {path}: {source}")]
    Load {
        path: String,
        source: Arc<std::io::Error>,
    },

    #[error("failed to parse persona file {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("persona file is missing required fields: {0}")]
    MissingPersonaFields(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("missing required config key: {0}")]
    MissingKey(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failures that abort a single posting cycle. The scheduler logs these
/// and continues at the next interval.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("completion service returned no content")]
    EmptyCompletion,

    #[error("prompt rendering failed: {0}")]
    Template(#[from] minijinja::Error),
}

/// Content selection failures.
#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("every search query category is in the recent window")]
    Exhausted,
}
