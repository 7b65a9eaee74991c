//! Trait definition for pluggable search backends.
//!
//! Each backend (DuckDuckGo, Perplexica, Brave) implements
//! [`SearchBackend`] to provide a uniform querying interface. A backend
//! coerces its provider-specific response shape into [`crate::types::RawItem`]
//! values and renders them as one formatted text block; the orchestrator
//! only ever sees that block.

use crate::config::AggregatorConfig;
use crate::error::AggregatorError;
use crate::types::Backend;

/// A pluggable search backend.
///
/// Implementors handle their own request construction, wire format,
/// and coercion to the common item shape. All implementations must be
/// `Send + Sync` for concurrent fan-out.
pub trait SearchBackend: Send + Sync {
    /// Query the backend and return its formatted content block.
    ///
    /// The returned text is a sequence of bulleted items, each carrying
    /// a `URL: ` line, capped at `config.max_items_per_backend`.
    ///
    /// # Errors
    ///
    /// Returns [`AggregatorError::Network`] or
    /// [`AggregatorError::RateLimited`] for transport failures (both
    /// retried by the retry layer), or [`AggregatorError::Parse`] when
    /// the response cannot be coerced into items.
    fn search(
        &self,
        query: &str,
        config: &AggregatorConfig,
    ) -> impl std::future::Future<Output = Result<String, AggregatorError>> + Send;

    /// Returns which [`Backend`] this implementation represents.
    fn backend_type(&self) -> Backend;
}
