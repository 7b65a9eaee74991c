//! # omnisearch
//!
//! Multi-backend search aggregation and answer formatting for
//! conversational agents.
//!
//! A query fans out concurrently to every configured backend
//! (DuckDuckGo HTML scraping, a Perplexica instance, the Brave Search
//! API); each slot settles independently so one broken backend never
//! hides the others. The settled results are merged in configuration
//! order, handed to a generation collaborator together with recent
//! conversation history, and the generated answer is parsed,
//! status-annotated, normalised and chunked for transport.
//!
//! ## Quick start
//!
//! ```no_run
//! use omnisearch::{orchestrate_search, format_results, AggregatorConfig};
//!
//! # async fn run() {
//! let config = AggregatorConfig::default();
//! let results = orchestrate_search("rust async runtimes", &config).await;
//! let document = format_results(&results, &config);
//! println!("{document}");
//! # }
//! ```
//!
//! For full conversational turns, construct an [`Aggregator`] with a
//! [`Generator`] implementation and call [`Aggregator::respond`].

pub mod backend;
pub mod backends;
pub mod cache;
pub mod chunk;
pub mod config;
pub mod error;
pub mod format;
pub mod generate;
pub mod http;
pub mod orchestrator;
pub mod rate_limit;
pub mod retry;
pub mod scrape;
pub mod session;
pub mod types;

pub use cache::{CacheKey, SearchCache};
pub use chunk::{split_chunks, DEFAULT_CHUNK_LIMIT};
pub use config::AggregatorConfig;
pub use error::{AggregatorError, Result};
pub use format::format_response;
pub use generate::{GenerateOptions, Generator, OllamaGenerator};
pub use orchestrator::{format_results, orchestrate_search};
pub use scrape::{ContentExtractor, FirecrawlExtractor};
pub use session::{ChatMessage, Role, SessionId, SessionStore};
pub use types::{Backend, SearchResult, SearchStatus, SlotState};

use session::{history_pairs, history_prompt};
use std::time::Duration;
use tracing::{info, warn};

/// Message shown to end users when a turn fails for any reason.
pub const USER_FACING_ERROR: &str =
    "Sorry, I encountered an error while processing your message. Please try again.";

/// Number of recent conversation turns folded into the generation prompt.
const PROMPT_HISTORY_TURNS: usize = 5;

/// Conversational search aggregator.
///
/// Owns its session store and result cache; generic over the
/// generation collaborator so tests can script one.
pub struct Aggregator<G: Generator> {
    config: AggregatorConfig,
    generator: G,
    options: GenerateOptions,
    sessions: SessionStore,
    cache: SearchCache,
}

impl<G: Generator> Aggregator<G> {
    /// Create an aggregator after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`AggregatorError::Config`] when the configuration is
    /// invalid.
    pub fn new(config: AggregatorConfig, generator: G) -> Result<Self> {
        config.validate()?;
        let cache = SearchCache::new(Duration::from_secs(config.cache_ttl_seconds));
        Ok(Self {
            config,
            generator,
            options: GenerateOptions::default(),
            sessions: SessionStore::default(),
            cache,
        })
    }

    /// Override generation options.
    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Run one conversational turn: search, generate, format, chunk.
    ///
    /// The user message is recorded in the session before searching.
    /// The assistant reply is recorded only when generation succeeds,
    /// so a failed turn never leaves a phantom assistant message in
    /// the history.
    ///
    /// # Errors
    ///
    /// Returns [`AggregatorError::AllBackendsFailed`] when every
    /// backend failed and generation also failed; otherwise propagates
    /// the generation error. Backend failures alone never fail the
    /// turn, they degrade to status slots in the output.
    pub async fn respond(&self, session: &SessionId, message: &str) -> Result<Vec<String>> {
        self.sessions.append(session, ChatMessage::user(message));
        let history = self.sessions.history(session);

        let results = self.search_cached(message, &history).await;
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        info!(
            %session,
            backends = results.len(),
            succeeded,
            "search settled"
        );

        let prompt = self.build_prompt(message, &history, &results);
        let generated = match self.generator.generate(&prompt, &history, &self.options).await {
            Ok(text) => text,
            Err(err) => return Err(settle_generation_failure(&results, err)),
        };

        self.sessions
            .append(session, ChatMessage::assistant(generated.clone()));

        let raw = attach_sources(&generated, &results);
        let status = SearchStatus::from_results(&results);
        let document = format::format_response(&raw, &status, self.config.include_thinking);
        Ok(split_chunks(&document, self.config.chunk_limit))
    }

    /// Fan a query out to the configured backends, via the cache.
    pub async fn search(&self, query: &str) -> Vec<SearchResult> {
        self.search_cached(query, &[]).await
    }

    async fn search_cached(&self, query: &str, history: &[ChatMessage]) -> Vec<SearchResult> {
        let key = CacheKey::new(query, &self.config.backends);
        if let Some(hit) = self.cache.get(&key).await {
            return hit;
        }

        let pairs = history_pairs(history);
        let results =
            orchestrator::orchestrate_search_with_history(query, &self.config, &pairs).await;

        // Only fully successful fan-outs are cached; a cached failure
        // would hide a backend's recovery for the whole TTL.
        if results.iter().all(SearchResult::is_success) {
            self.cache.insert(key, results.clone()).await;
        }
        results
    }

    fn build_prompt(
        &self,
        message: &str,
        history: &[ChatMessage],
        results: &[SearchResult],
    ) -> String {
        let mut prompt = String::new();

        let recent = history_prompt(history, PROMPT_HISTORY_TURNS);
        if !recent.is_empty() {
            prompt.push_str("Conversation so far:\n");
            prompt.push_str(&recent);
            prompt.push('\n');
        }

        let context = orchestrator::merge::merge_results(results);
        if context.is_empty() {
            warn!("no backend produced content, answering without search context");
            prompt.push_str(
                "No search results are available for this question. Answer from \
                 general knowledge and say that live sources could not be reached.\n\n",
            );
        } else {
            prompt.push_str("Search results:\n");
            prompt.push_str(&context);
            prompt.push_str("\n\n");
        }

        prompt.push_str("Question: ");
        prompt.push_str(message);
        prompt
    }
}

/// Weave a sources section with the settled result URLs into the
/// generated text so the formatter can extract and number them even
/// when the generated answer does not repeat the links.
///
/// The block is inserted before the answer marker when present; text
/// after the marker is the direct answer and must stay URL-free.
fn attach_sources(generated: &str, results: &[SearchResult]) -> String {
    let urls: Vec<&str> = results
        .iter()
        .filter(|r| r.is_success())
        .filter_map(|r| r.url.as_deref())
        .collect();
    if urls.is_empty() {
        return generated.to_string();
    }

    let mut block = String::from("### Sources\n");
    for (index, url) in urls.iter().enumerate() {
        block.push_str(&format!("[{}] {url}\n", index + 1));
    }

    match generated.find(format::ANSWER_MARKER) {
        Some(pos) => format!("{}\n{block}\n{}", &generated[..pos], &generated[pos..]),
        None => format!("{generated}\n\n{block}"),
    }
}

/// Apply the total-failure policy to a failed generation attempt.
///
/// When no backend produced content either, the turn is reported as
/// [`AggregatorError::AllBackendsFailed`] carrying the per-backend
/// messages; otherwise the generation error stands on its own.
fn settle_generation_failure(results: &[SearchResult], err: AggregatorError) -> AggregatorError {
    if results.iter().any(SearchResult::is_success) {
        return err;
    }
    let detail: Vec<String> = results
        .iter()
        .map(|r| {
            format!(
                "{}: {}",
                r.source,
                r.error.as_deref().unwrap_or("not attempted")
            )
        })
        .collect();
    warn!(generation_error = %err, "no backend content and generation failed");
    AggregatorError::AllBackendsFailed(detail.join("; "))
}
