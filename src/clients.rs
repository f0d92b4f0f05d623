//! External service boundaries: completion, search, thread candidates, and
//! publishing.
//!
//! Each collaborator is a trait the cycle executor consumes as a black box.
//! Implementations log their own transport failures and surface them as
//! `None`/empty results; the core treats a missing result and an error
//! identically.

pub mod completion;
pub mod publisher;
pub mod search;
pub mod threads;

pub use completion::{ChatMessage, Completion, CompletionClient, OpenAiCompletionClient};
pub use publisher::{DryRunPublisher, Publisher, XPublisher};
pub use search::{PerplexitySearchClient, SearchClient, SearchResult};
pub use threads::{ThreadCandidate, ThreadSource, XThreadSource};
