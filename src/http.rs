//! Shared HTTP client construction for backend and collaborator requests.
//!
//! Provides a configured [`reqwest::Client`] with browser-like headers,
//! cookie support, and rotating User-Agent strings, plus the mapping
//! from HTTP status codes to the crate's transient/terminal error split.

use crate::config::AggregatorConfig;
use crate::error::AggregatorError;
use crate::types::Backend;
use rand::seq::SliceRandom;
use std::time::Duration;

/// Realistic browser User-Agent strings, rotated per client.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:134.0) Gecko/20100101 Firefox/134.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:134.0) Gecko/20100101 Firefox/134.0",
];

/// Build a [`reqwest::Client`] for querying search backends.
///
/// The client has a cookie store (consent pages), the configured
/// timeout, gzip/brotli decompression, bounded redirects, and either
/// the configured User-Agent or a random one from the rotation list.
///
/// # Errors
///
/// Returns [`AggregatorError::Network`] if the client cannot be built.
pub fn build_client(config: &AggregatorConfig) -> Result<reqwest::Client, AggregatorError> {
    let ua = match config.user_agent {
        Some(ref custom) => custom.clone(),
        None => random_user_agent().to_owned(),
    };

    reqwest::Client::builder()
        .cookie_store(true)
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(ua)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| AggregatorError::Network(format!("failed to build HTTP client: {e}")))
}

/// Select a random User-Agent string from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS.choose(&mut rng).copied().unwrap_or(USER_AGENTS[0])
}

/// Map a non-success HTTP status to the transient/terminal error split.
///
/// HTTP 429 becomes [`AggregatorError::RateLimited`] so the retry layer
/// treats it the same as a network failure; every other non-success
/// status becomes [`AggregatorError::Network`].
pub fn status_error(backend: Backend, status: reqwest::StatusCode) -> AggregatorError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        AggregatorError::RateLimited(format!("{backend}: HTTP {status}"))
    } else {
        AggregatorError::Network(format!("{backend}: HTTP {status}"))
    }
}

/// Map a [`reqwest::Error`] from a backend request to a crate error.
pub fn request_error(backend: Backend, err: reqwest::Error) -> AggregatorError {
    AggregatorError::Network(format!("{backend} request failed: {err}"))
}
