//! Persisted agent state: latest publish, publish history, and the
//! anti-repetition windows.
//!
//! Each state slice lives in its own line-delimited JSON file under the data
//! directory. A missing file is an empty slice, not an error. Reads degrade
//! to empty on any failure and writes log and drop their errors: the agent
//! keeps running with "no history" rather than halting, at the cost of a
//! repetition risk after a failed persist.

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt as _;

const LATEST_PUBLISH_FILE: &str = "latest_publish.json";
const PUBLISH_HISTORY_FILE: &str = "publish_history.jsonl";
const RECENT_TOPICS_FILE: &str = "recent_topics.jsonl";
const RECENT_SEARCH_QUERIES_FILE: &str = "recent_search_queries.jsonl";

/// The most recent successful publish. Overwritten, never appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRecord {
    /// Identifier assigned by the posting platform.
    pub id: String,
    pub text: String,
    /// Unix seconds.
    pub timestamp: i64,
}

/// Durable store for the four agent state slices.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
    max_topics: usize,
    max_search_queries: usize,
}

impl StateStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: &Path, max_topics: usize, max_search_queries: usize) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            max_topics,
            max_search_queries,
        })
    }

    /// The latest publish record, or None if never written or unreadable.
    pub async fn latest_publish(&self) -> Option<PublishRecord> {
        read_lines(&self.dir.join(LATEST_PUBLISH_FILE))
            .await
            .into_iter()
            .next()
    }

    /// Record a confirmed publish: append the text to the archival history,
    /// then overwrite the latest-publish record. Called only after the
    /// platform acknowledged the post, so a failure here loses bookkeeping,
    /// never content. A failed history append skips the latest-publish write
    /// so the pair stays a no-op.
    pub async fn record_publish(&self, record: &PublishRecord) {
        let history_path = self.dir.join(PUBLISH_HISTORY_FILE);
        if let Err(error) = append_line(&history_path, &record.text).await {
            tracing::error!(%error, path = %history_path.display(), "failed to append publish history");
            return;
        }

        let latest_path = self.dir.join(LATEST_PUBLISH_FILE);
        if let Err(error) = write_lines(&latest_path, std::slice::from_ref(record)).await {
            tracing::error!(%error, path = %latest_path.display(), "failed to write latest publish");
        }
    }

    /// Every text ever published, oldest first.
    pub async fn publish_history(&self) -> Vec<String> {
        read_lines(&self.dir.join(PUBLISH_HISTORY_FILE)).await
    }

    /// Topics used in recent cycles, oldest first.
    pub async fn recent_topics(&self) -> Vec<String> {
        read_lines(&self.dir.join(RECENT_TOPICS_FILE)).await
    }

    /// Append topics to the recent window, evicting the oldest beyond the cap.
    pub async fn add_topics(&self, topics: &[String]) {
        let mut window = self.recent_topics().await;
        window.extend_from_slice(topics);
        truncate_to_newest(&mut window, self.max_topics);

        let path = self.dir.join(RECENT_TOPICS_FILE);
        if let Err(error) = write_lines(&path, &window).await {
            tracing::error!(%error, path = %path.display(), "failed to write recent topics");
        }
    }

    /// Search query categories used in recent cycles, oldest first.
    pub async fn recent_search_queries(&self) -> Vec<String> {
        read_lines(&self.dir.join(RECENT_SEARCH_QUERIES_FILE)).await
    }

    /// Append one category to the recent window, evicting beyond the cap.
    pub async fn add_search_query(&self, category: &str) {
        let mut window = self.recent_search_queries().await;
        window.push(category.to_string());
        truncate_to_newest(&mut window, self.max_search_queries);

        let path = self.dir.join(RECENT_SEARCH_QUERIES_FILE);
        if let Err(error) = write_lines(&path, &window).await {
            tracing::error!(%error, path = %path.display(), "failed to write recent search queries");
        }
    }
}

/// Keep only the newest `cap` entries, preserving insertion order.
fn truncate_to_newest<T>(window: &mut Vec<T>, cap: usize) {
    let excess = window.len().saturating_sub(cap);
    if excess > 0 {
        window.drain(..excess);
    }
}

/// Read a line-delimited JSON file into a Vec. A missing file is empty;
/// any other failure is logged and also yields empty.
async fn read_lines<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(error) => {
            tracing::error!(%error, path = %path.display(), "failed to read state file");
            return Vec::new();
        }
    };

    let mut items = Vec::new();
    for line in raw.lines().filter(|line| !line.trim().is_empty()) {
        match serde_json::from_str(line) {
            Ok(item) => items.push(item),
            Err(error) => {
                tracing::error!(%error, path = %path.display(), "corrupt state line, ignoring file");
                return Vec::new();
            }
        }
    }
    items
}

/// Rewrite a file with one JSON line per item.
async fn write_lines<T: Serialize>(path: &Path, items: &[T]) -> anyhow::Result<()> {
    let mut contents = String::new();
    for item in items {
        contents.push_str(&serde_json::to_string(item)?);
        contents.push('\n');
    }
    tokio::fs::write(path, contents).await?;
    Ok(())
}

/// Append a single JSON line to a file, creating it if needed.
async fn append_line<T: Serialize>(path: &Path, item: &T) -> anyhow::Result<()> {
    let mut line = serde_json::to_string(item)?;
    line.push('\n');
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}
