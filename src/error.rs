//! Error types for the omnisearch crate.
//!
//! All errors carry stable string messages suitable for logging and
//! programmatic handling. Transient errors ([`AggregatorError::Network`]
//! and [`AggregatorError::RateLimited`]) are retried by the retry layer;
//! everything else fails the operation immediately. No provider keys or
//! other sensitive data appear in error messages.

/// Errors that can occur while aggregating search results and
/// assembling an answer.
#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    /// An HTTP request to a backend or collaborator failed. Transient.
    #[error("network error: {0}")]
    Network(String),

    /// A backend signalled it is rate-limiting us (HTTP 429). Transient.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// A provider response could not be parsed into results.
    #[error("parse error: {0}")]
    Parse(String),

    /// Content extraction for a single URL failed. Fatal per URL only:
    /// the caller omits that source's detail and keeps its citation.
    #[error("scrape error: {0}")]
    Scrape(String),

    /// The generation collaborator returned blank text. Fatal for the
    /// current turn; conversation history must not be updated.
    #[error("generation returned empty text")]
    EmptyGeneration,

    /// A backend operation kept failing after every allowed retry.
    /// Rendered as a failed status slot, never aborts orchestration.
    #[error("{backend}: retries exhausted: {message}")]
    ExhaustedRetries {
        /// Name of the backend whose retries ran out.
        backend: String,
        /// Message of the last underlying failure.
        message: String,
    },

    /// Every configured backend failed and the generation step also
    /// failed, so there is nothing to answer with.
    #[error("all search backends failed: {0}")]
    AllBackendsFailed(String),

    /// Invalid aggregator configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl AggregatorError {
    /// Whether this error class is worth retrying with a fixed delay.
    ///
    /// Only network and rate-limit failures are transient; parse,
    /// scrape, configuration and generation errors are terminal.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimited(_))
    }
}

/// Convenience type alias for omnisearch results.
pub type Result<T> = std::result::Result<T, AggregatorError>;
