//! Driftbot CLI entry point.

use anyhow::Context as _;
use clap::Parser;
use driftbot::agent::{Alternate, Always, CycleExecutor, CyclePolicy, Scheduler};
use driftbot::clients::{
    DryRunPublisher, OpenAiCompletionClient, PerplexitySearchClient, Publisher, SearchClient,
    ThreadSource, XPublisher, XThreadSource,
};
use driftbot::config::{Config, CycleConfig};
use driftbot::persona::Persona;
use driftbot::prompt::PromptAssembler;
use driftbot::store::StateStore;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "driftbot")]
#[command(about = "A persona-driven agent that drafts and publishes social posts")]
struct Cli {
    /// Persona name (locates personas/<name>.json)
    persona: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Log drafts instead of publishing them
    #[arg(long)]
    dry_run: bool,
}

/// A search client used when no search key is configured: every query
/// resolves to nothing and post prompts carry empty trending context.
struct DisabledSearch;

#[async_trait::async_trait]
impl SearchClient for DisabledSearch {
    async fn search(&self, query: &str) -> Option<driftbot::clients::SearchResult> {
        tracing::debug!(query, "search disabled, no SEARCH_API_KEY configured");
        None
    }
}

/// A thread source used when no platform token is configured.
struct DisabledThreads;

#[async_trait::async_trait]
impl ThreadSource for DisabledThreads {
    async fn search(&self) -> Vec<driftbot::clients::ThreadCandidate> {
        tracing::debug!("thread search disabled, no X_BEARER_TOKEN configured");
        Vec::new()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load().with_context(|| "failed to load configuration")?;

    let persona_path = config.persona_path(&cli.persona);
    let persona = Persona::load(&persona_path)
        .await
        .with_context(|| format!("failed to load persona {}", cli.persona))?;

    let filter = if cli.debug || persona.debug() {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!(
        persona = %persona.name,
        data_dir = %config.data_dir.display(),
        "starting driftbot"
    );

    let store = Arc::new(
        StateStore::open(
            &config.state_dir(&cli.persona),
            config.schedule.max_recent_topics,
            config.schedule.max_recent_queries,
        )
        .with_context(|| "failed to open state store")?,
    );

    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(120))
        .build()
        .with_context(|| "failed to build HTTP client")?;

    let completion = Arc::new(OpenAiCompletionClient::new(
        http.clone(),
        config.completion.base_url.clone(),
        config.completion.api_key.clone(),
    ));

    let search: Arc<dyn SearchClient> = match &config.search.api_key {
        Some(key) => Arc::new(PerplexitySearchClient::new(
            http.clone(),
            config.search.base_url.clone(),
            key.clone(),
        )),
        None => Arc::new(DisabledSearch),
    };

    let dry_run = cli.dry_run || config.platform.dry_run || config.platform.bearer_token.is_none();
    let (threads, publisher): (Arc<dyn ThreadSource>, Arc<dyn Publisher>) =
        match &config.platform.bearer_token {
            Some(token) => {
                let threads: Arc<dyn ThreadSource> = Arc::new(XThreadSource::new(
                    http.clone(),
                    config.platform.base_url.clone(),
                    token.clone(),
                    config.platform.thread_query.clone(),
                ));
                let publisher: Arc<dyn Publisher> = if dry_run {
                    Arc::new(DryRunPublisher)
                } else {
                    Arc::new(XPublisher::new(
                        http.clone(),
                        config.platform.base_url.clone(),
                        token.clone(),
                    ))
                };
                (threads, publisher)
            }
            None => {
                tracing::warn!("no X_BEARER_TOKEN configured, running dry with no reply candidates");
                (Arc::new(DisabledThreads), Arc::new(DryRunPublisher))
            }
        };
    if dry_run {
        tracing::info!("dry run enabled, drafts will be logged instead of published");
    }

    let executor = CycleExecutor::new(
        persona,
        store.clone(),
        PromptAssembler::new().with_context(|| "failed to compile prompt templates")?,
        completion,
        search,
        threads,
        publisher,
    );

    let policy: Box<dyn CyclePolicy> = match config.cycle {
        CycleConfig::Always(kind) => Box::new(Always(kind)),
        CycleConfig::Alternate => Box::new(Alternate::default()),
    };

    let scheduler = Scheduler::new(
        executor,
        policy,
        store,
        config.schedule.min_interval_minutes,
        config.schedule.max_interval_minutes,
    );

    tokio::select! {
        _ = scheduler.run() => {
            tracing::info!("scheduler loop ended");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    tracing::info!("driftbot stopped");
    Ok(())
}
