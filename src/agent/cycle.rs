//! One posting cycle: select content, assemble a prompt, obtain a
//! completion, publish, and persist the outcome.
//!
//! State is persisted only after the platform acknowledges the publish with
//! a non-empty id, so a crash mid-cycle risks one un-recorded publish, never
//! a record of a failed one.

use crate::clients::{ChatMessage, CompletionClient, Publisher, SearchClient, ThreadSource};
use crate::error::CycleError;
use crate::persona::Persona;
use crate::prompt::{self, PromptAssembler, PromptState};
use crate::selector::ContentSelector;
use crate::store::{PublishRecord, StateStore};
use std::sync::Arc;

/// The two kinds of posting cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind {
    /// An original post grounded in retrieved trending content.
    Post,
    /// A reply to the highest-engagement trending thread.
    Reply,
}

impl std::fmt::Display for CycleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleKind::Post => write!(f, "post"),
            CycleKind::Reply => write!(f, "reply"),
        }
    }
}

/// Decides which kind of cycle runs next. Injectable so deployments can
/// pin one kind or rotate between them.
pub trait CyclePolicy: Send {
    fn next_kind(&mut self) -> CycleKind;
}

/// Always run the same kind of cycle.
#[derive(Debug, Clone, Copy)]
pub struct Always(pub CycleKind);

impl CyclePolicy for Always {
    fn next_kind(&mut self) -> CycleKind {
        self.0
    }
}

/// Alternate between posts and replies, starting with a post.
#[derive(Debug, Clone, Copy)]
pub struct Alternate {
    upcoming: CycleKind,
}

impl Default for Alternate {
    fn default() -> Self {
        Self {
            upcoming: CycleKind::Post,
        }
    }
}

impl CyclePolicy for Alternate {
    fn next_kind(&mut self) -> CycleKind {
        let kind = self.upcoming;
        self.upcoming = match kind {
            CycleKind::Post => CycleKind::Reply,
            CycleKind::Reply => CycleKind::Post,
        };
        kind
    }
}

/// Executes posting cycles against the external collaborators.
pub struct CycleExecutor {
    persona: Arc<Persona>,
    selector: ContentSelector,
    assembler: PromptAssembler,
    store: Arc<StateStore>,
    completion: Arc<dyn CompletionClient>,
    search: Arc<dyn SearchClient>,
    threads: Arc<dyn ThreadSource>,
    publisher: Arc<dyn Publisher>,
}

impl CycleExecutor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        persona: Arc<Persona>,
        store: Arc<StateStore>,
        assembler: PromptAssembler,
        completion: Arc<dyn CompletionClient>,
        search: Arc<dyn SearchClient>,
        threads: Arc<dyn ThreadSource>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            selector: ContentSelector::new(persona.clone(), store.clone()),
            persona,
            assembler,
            store,
            completion,
            search,
            threads,
            publisher,
        }
    }

    /// Run one cycle of the given kind.
    pub async fn run(&self, kind: CycleKind) -> Result<(), CycleError> {
        match kind {
            CycleKind::Post => self.run_post().await,
            CycleKind::Reply => self.run_reply().await,
        }
    }

    async fn run_post(&self) -> Result<(), CycleError> {
        let query = self.selector.search_query().await?;
        let retrieved = self.search.search(&query).await;
        let (content, sources) = match &retrieved {
            Some(result) => (result.content.as_str(), result.sources.as_str()),
            None => ("", ""),
        };

        let state = self.prompt_state().await;
        let prompt = self.assembler.render_post(&state, content, sources)?;
        tracing::debug!(%prompt, "assembled post prompt");

        let text = self.request_completion(prompt).await?;
        self.publish_and_record(text).await;
        Ok(())
    }

    async fn run_reply(&self) -> Result<(), CycleError> {
        let mut candidates = self.threads.search().await;
        // Stable sort keeps arrival order between candidates with equal
        // engagement.
        candidates.sort_by_key(|candidate| std::cmp::Reverse(candidate.engagement_score()));

        let Some(top) = candidates.into_iter().next() else {
            tracing::info!("no relevant threads found, skipping cycle");
            return Ok(());
        };
        let quote_url = top.url();

        let state = self.prompt_state().await;
        let prompt = self.assembler.render_reply(&state, &top.text)?;
        tracing::debug!(%prompt, "assembled reply prompt");

        let text = self.request_completion(prompt).await?;
        self.publish_and_record(format!("{text} {quote_url}")).await;
        Ok(())
    }

    async fn prompt_state(&self) -> PromptState {
        let (_, topics) = self.selector.topics().await;
        PromptState {
            agent_name: self.persona.name.clone(),
            handle: self.persona.handle().to_string(),
            knowledge: self.selector.knowledge(),
            bio: self.selector.bio(),
            lore: self.selector.lore(),
            topics,
            post_directions: prompt::post_directions(&self.persona),
        }
    }

    async fn request_completion(&self, prompt: String) -> Result<String, CycleError> {
        let messages = [
            ChatMessage::system(self.persona.system.clone()),
            ChatMessage::user(prompt),
        ];
        // A response with blank content counts as a failed completion, no
        // matter what the client implementation let through.
        self.completion
            .complete(self.persona.model(), &messages)
            .await
            .map(|completion| completion.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(CycleError::EmptyCompletion)
    }

    /// Publish and, on a confirmed id, persist the outcome. A publish that
    /// yields no id (failure or dry run) leaves all state untouched.
    async fn publish_and_record(&self, text: String) {
        let Some(id) = self.publisher.publish(&text).await.filter(|id| !id.is_empty()) else {
            tracing::info!("publish unconfirmed, nothing recorded");
            return;
        };

        tracing::debug!(%id, "publish confirmed");
        let record = PublishRecord {
            id,
            text,
            timestamp: chrono::Utc::now().timestamp(),
        };
        self.store.record_publish(&record).await;
    }
}
