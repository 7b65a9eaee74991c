//! Concurrent backend fan-out with all-settled merging.
//!
//! Every configured backend is queried simultaneously; each slot
//! resolves independently to a success or a failure entry, so one hung
//! or broken backend never aborts the others. Output order is the
//! fixed configuration order, not completion order.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::backend::SearchBackend;
use crate::backends::{BraveBackend, DuckDuckGoBackend, PerplexicaBackend};
use crate::backends::perplexica::HistoryPair;
use crate::config::AggregatorConfig;
use crate::error::{AggregatorError, Result};
use crate::rate_limit::RateLimiter;
use crate::retry::{call_with_retry, RetryPolicy};
use crate::types::{Backend, SearchResult};

/// Process-lifetime pacing gates, one per backend.
///
/// The rate is fixed on first access; later searches reuse the
/// existing limiter regardless of their configured rate.
static LIMITERS: OnceLock<HashMap<Backend, RateLimiter>> = OnceLock::new();

fn backend_limiter(backend: Backend, calls_per_second: f64) -> &'static RateLimiter {
    let limiters = LIMITERS.get_or_init(|| {
        Backend::all()
            .iter()
            .map(|b| (*b, RateLimiter::new(calls_per_second)))
            .collect()
    });
    // Backend::all covers every variant, so the lookup cannot miss.
    &limiters[&backend]
}

/// Fan a query out to all configured backends concurrently.
///
/// Returns one [`SearchResult`] per configured backend, in the exact
/// configuration order. A failing backend yields an entry with empty
/// content and its error message; this function itself never fails.
pub async fn orchestrate_search(query: &str, config: &AggregatorConfig) -> Vec<SearchResult> {
    orchestrate_search_with_history(query, config, &[]).await
}

/// Like [`orchestrate_search`], forwarding conversation history to
/// backends that accept it (Perplexica).
pub async fn orchestrate_search_with_history(
    query: &str,
    config: &AggregatorConfig,
    history: &[HistoryPair],
) -> Vec<SearchResult> {
    let policy = RetryPolicy::from_config(config);

    let futures: Vec<_> = config
        .backends
        .iter()
        .map(|backend| {
            let backend = *backend;
            let query = query.to_string();
            let config = config.clone();
            let history = history.to_vec();
            async move { run_backend(backend, &query, &config, &history, &policy).await }
        })
        .collect();

    // join_all preserves input order, which is the configuration order.
    futures::future::join_all(futures).await
}

/// Query one backend under rate limiting and retry, settling to a
/// terminal [`SearchResult`] either way.
async fn run_backend(
    backend: Backend,
    query: &str,
    config: &AggregatorConfig,
    history: &[HistoryPair],
    policy: &RetryPolicy,
) -> SearchResult {
    let limiter = backend_limiter(backend, config.rate_limit_cps);

    let outcome = call_with_retry(backend, limiter, policy, || {
        query_backend(backend, query, config, history)
    })
    .await;

    match outcome {
        Ok(content) => {
            let url = extract_source_url(&content);
            tracing::debug!(%backend, chars = content.len(), "backend returned content");
            SearchResult::ok(backend, content, url)
        }
        Err(err) => {
            tracing::warn!(%backend, error = %err, "backend query failed");
            SearchResult::failed(backend, err.to_string())
        }
    }
}

/// Dispatch to the concrete backend implementation.
async fn query_backend(
    backend: Backend,
    query: &str,
    config: &AggregatorConfig,
    history: &[HistoryPair],
) -> Result<String> {
    match backend {
        Backend::DuckDuckGo => DuckDuckGoBackend.search(query, config).await,
        Backend::Perplexica => {
            PerplexicaBackend::with_history(history.to_vec())
                .search(query, config)
                .await
        }
        Backend::Brave => BraveBackend.search(query, config).await,
    }
}

static URL_MARKER: OnceLock<Regex> = OnceLock::new();

/// Extract one representative URL from a backend's formatted text.
///
/// Matches the first literal `URL: ` marker followed by an http(s)
/// URL. Items rendered with the `No URL` fallback do not match.
pub fn extract_source_url(content: &str) -> Option<String> {
    let re = URL_MARKER.get_or_init(|| {
        Regex::new(r"URL: (https?://\S+)").expect("URL marker pattern is valid")
    });
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// All-settled merge of independently produced backend outcomes.
///
/// Used by tests and by callers that query backends through their own
/// transport: converts per-backend `Result`s into the ordered,
/// failure-tolerant result list without ever raising.
pub fn settle_outcomes(
    outcomes: Vec<(Backend, std::result::Result<String, AggregatorError>)>,
) -> Vec<SearchResult> {
    outcomes
        .into_iter()
        .map(|(backend, outcome)| match outcome {
            Ok(content) => {
                let url = extract_source_url(&content);
                SearchResult::ok(backend, content, url)
            }
            Err(err) => SearchResult::failed(backend, err.to_string()),
        })
        .collect()
}
