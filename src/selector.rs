//! Randomized content selection with anti-repetition windows.
//!
//! Every draw is uniform and without replacement within a single call, and
//! independent across calls. The persona's source sequences are never
//! mutated; shuffles run on cloned buffers. Topic and search-query picks
//! exclude whatever sits in the persisted recent windows and register their
//! choices back into them.

use crate::error::SelectionError;
use crate::persona::Persona;
use crate::store::StateStore;
use rand::seq::{IndexedRandom as _, SliceRandom as _};
use std::sync::Arc;

const KNOWLEDGE_COUNT: usize = 3;
const BIO_COUNT: usize = 3;
const LORE_COUNT: usize = 10;
const TOPIC_COUNT: usize = 5;

/// Picks persona excerpts and non-repeating topics/search queries.
#[derive(Debug, Clone)]
pub struct ContentSelector {
    persona: Arc<Persona>,
    store: Arc<StateStore>,
}

impl ContentSelector {
    pub fn new(persona: Arc<Persona>, store: Arc<StateStore>) -> Self {
        Self { persona, store }
    }

    /// Up to three knowledge entries in random order, newline-joined.
    pub fn knowledge(&self) -> String {
        let mut shuffled = self.persona.knowledge.clone();
        shuffled.shuffle(&mut rand::rng());
        shuffled.truncate(KNOWLEDGE_COUNT);
        shuffled.join("\n")
    }

    /// Up to three distinct bio entries, space-joined.
    pub fn bio(&self) -> String {
        let mut shuffled = self.persona.bio.clone();
        shuffled.shuffle(&mut rand::rng());
        shuffled.truncate(BIO_COUNT);
        shuffled.join(" ")
    }

    /// Up to ten lore entries in random order, newline-joined.
    pub fn lore(&self) -> String {
        let mut shuffled = self.persona.lore.clone();
        shuffled.shuffle(&mut rand::rng());
        shuffled.truncate(LORE_COUNT);
        shuffled.join("\n")
    }

    /// Up to five topics not in the recent window, plus the rendered
    /// interest sentence. Registers the chosen topics into the window.
    /// When every topic is recent the selection is empty and the rendered
    /// sentence is empty too.
    pub async fn topics(&self) -> (Vec<String>, String) {
        let recent = self.store.recent_topics().await;
        let mut available: Vec<String> = self
            .persona
            .topics
            .iter()
            .filter(|topic| !recent.contains(*topic))
            .cloned()
            .collect();
        available.shuffle(&mut rand::rng());
        available.truncate(TOPIC_COUNT);

        self.store.add_topics(&available).await;

        let formatted = if available.is_empty() {
            String::new()
        } else {
            format!(
                "{} is interested in {}",
                self.persona.name,
                join_natural(&available)
            )
        };
        (available, formatted)
    }

    /// One search query from a category outside the recent window.
    /// Registers the chosen category into the window.
    pub async fn search_query(&self) -> Result<String, SelectionError> {
        let recent = self.store.recent_search_queries().await;
        let available: Vec<&String> = self
            .persona
            .search_queries
            .keys()
            .filter(|category| !recent.contains(*category))
            .collect();

        let category = available
            .choose(&mut rand::rng())
            .copied()
            .ok_or(SelectionError::Exhausted)?;
        self.store.add_search_query(category).await;

        self.persona
            .search_queries
            .get(category)
            .and_then(|queries| queries.choose(&mut rand::rng()))
            .cloned()
            .ok_or(SelectionError::Exhausted)
    }
}

/// Join items with ", " except for " and " before the final item.
fn join_natural(items: &[String]) -> String {
    let mut out = String::new();
    for (index, item) in items.iter().enumerate() {
        out.push_str(item);
        if items.len() >= 2 && index == items.len() - 2 {
            out.push_str(" and ");
        } else if index + 1 < items.len() {
            out.push_str(", ");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn persona_with(topics: &[&str], search_queries: &[(&str, &[&str])]) -> Arc<Persona> {
        let queries: serde_json::Map<String, serde_json::Value> = search_queries
            .iter()
            .map(|(category, queries)| {
                (
                    category.to_string(),
                    serde_json::json!(queries.iter().collect::<Vec<_>>()),
                )
            })
            .collect();
        let raw = serde_json::json!({
            "name": "daige",
            "settings": {"model": "gpt-4o"},
            "system": "You are daige.",
            "bio": ["one", "two", "three", "four"],
            "lore": ["l1", "l2"],
            "adjectives": ["terse"],
            "topics": topics,
            "style": {"all": ["be brief"]},
            "knowledge": ["k1", "k2", "k3", "k4"],
            "search_queries": queries,
        });
        Arc::new(serde_json::from_value(raw).expect("test persona should deserialize"))
    }

    fn store_in(dir: &std::path::Path) -> Arc<StateStore> {
        Arc::new(StateStore::open(dir, 5, 7).expect("store should open"))
    }

    #[tokio::test]
    async fn picks_five_distinct_topics_from_the_persona() {
        let dir = tempfile::tempdir().expect("tempdir");
        let persona = persona_with(
            &["a", "b", "c", "d", "e", "f", "g"],
            &[("ai", &["q1"])],
        );
        let selector = ContentSelector::new(persona.clone(), store_in(dir.path()));

        let (chosen, formatted) = selector.topics().await;
        assert_eq!(chosen.len(), 5);
        let distinct: HashSet<&String> = chosen.iter().collect();
        assert_eq!(distinct.len(), 5);
        for topic in &chosen {
            assert!(persona.topics.contains(topic));
        }
        assert!(formatted.starts_with("daige is interested in "));
        assert!(formatted.contains(" and "));
    }

    #[tokio::test]
    async fn exhausted_topics_yield_an_empty_selection() {
        let dir = tempfile::tempdir().expect("tempdir");
        let persona = persona_with(&["a", "b"], &[("ai", &["q1"])]);
        let store = store_in(dir.path());
        store.add_topics(&["a".into(), "b".into()]).await;

        let selector = ContentSelector::new(persona, store);
        let (chosen, formatted) = selector.topics().await;
        assert!(chosen.is_empty());
        assert!(formatted.is_empty());
    }

    #[tokio::test]
    async fn topics_never_mutate_the_persona() {
        let dir = tempfile::tempdir().expect("tempdir");
        let persona = persona_with(&["a", "b", "c"], &[("ai", &["q1"])]);
        let selector = ContentSelector::new(persona.clone(), store_in(dir.path()));

        selector.topics().await;
        assert_eq!(persona.topics, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn single_category_query_is_picked_and_registered() {
        let dir = tempfile::tempdir().expect("tempdir");
        let persona = persona_with(&["a"], &[("ai", &["q1"])]);
        let store = store_in(dir.path());
        let selector = ContentSelector::new(persona, store.clone());

        let query = selector.search_query().await.expect("query should be picked");
        assert_eq!(query, "q1");
        assert_eq!(store.recent_search_queries().await, vec!["ai"]);
    }

    #[tokio::test]
    async fn recent_category_is_excluded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let persona = persona_with(&["a"], &[("ai", &["q1"]), ("sec", &["q2"])]);
        let store = store_in(dir.path());
        store.add_search_query("ai").await;

        let selector = ContentSelector::new(persona, store);
        let query = selector.search_query().await.expect("query should be picked");
        assert_eq!(query, "q2");
    }

    #[tokio::test]
    async fn exhausted_categories_are_a_recoverable_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let persona = persona_with(&["a"], &[("ai", &["q1"])]);
        let store = store_in(dir.path());
        store.add_search_query("ai").await;

        let selector = ContentSelector::new(persona, store);
        let error = selector.search_query().await.expect_err("should be exhausted");
        assert!(matches!(error, SelectionError::Exhausted));
    }

    #[tokio::test]
    async fn query_never_comes_from_the_recent_window() {
        let dir = tempfile::tempdir().expect("tempdir");
        let categories: Vec<(String, Vec<String>)> = (0..8)
            .map(|i| (format!("c{i}"), vec![format!("c{i}-query")]))
            .collect();
        let raw = serde_json::json!({
            "name": "daige",
            "settings": {"model": "gpt-4o"},
            "system": "You are daige.",
            "bio": ["one"],
            "lore": ["l1"],
            "adjectives": ["terse"],
            "topics": ["a"],
            "style": {"all": ["be brief"]},
            "knowledge": ["k1"],
            "search_queries": categories
                .iter()
                .map(|(c, q)| (c.clone(), serde_json::json!(q)))
                .collect::<serde_json::Map<_, _>>(),
        });
        let persona: Arc<Persona> =
            Arc::new(serde_json::from_value(raw).expect("test persona should deserialize"));
        let store = store_in(dir.path());
        let selector = ContentSelector::new(persona, store.clone());

        // Window cap is 7, so with 8 categories a draw is always possible
        // and must never name a category in the current window.
        for _ in 0..32 {
            let window = store.recent_search_queries().await;
            let query = selector.search_query().await.expect("a category remains");
            let category = query.trim_end_matches("-query");
            assert!(!window.contains(&category.to_string()));
        }
    }

    #[test]
    fn natural_join_formats_like_a_sentence() {
        let items = |names: &[&str]| names.iter().map(|n| n.to_string()).collect::<Vec<_>>();
        assert_eq!(join_natural(&items(&["a"])), "a");
        assert_eq!(join_natural(&items(&["a", "b"])), "a and b");
        assert_eq!(join_natural(&items(&["a", "b", "c"])), "a, b and c");
        assert_eq!(join_natural(&[]), "");
    }
}
