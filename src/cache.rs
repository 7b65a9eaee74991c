//! Short-lived cache for settled search outcomes.
//!
//! The cache is an injected value owned by the aggregator, not a
//! process-wide global, so embedders and tests control its lifetime.
//! Keys combine the normalised query with the configured backend set;
//! changing either misses. A zero TTL disables caching entirely.

use crate::types::{Backend, SearchResult};
use moka::future::Cache;
use std::time::Duration;
use tracing::debug;

const DEFAULT_CAPACITY: u64 = 256;

/// Cache key: normalised query text plus the backend set it was fanned
/// out to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    query: String,
    backends: Vec<Backend>,
}

impl CacheKey {
    /// Build a key from raw query text and a backend set. The query is
    /// lowercased and whitespace-collapsed; the backend list is sorted
    /// so configuration order does not affect identity.
    pub fn new(query: &str, backends: &[Backend]) -> Self {
        let query = query
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        let mut backends = backends.to_vec();
        backends.sort_by_key(|b| b.name());
        backends.dedup();
        Self { query, backends }
    }
}

/// Injected result cache wrapping [`moka::future::Cache`].
#[derive(Debug, Clone)]
pub struct SearchCache {
    inner: Option<Cache<CacheKey, Vec<SearchResult>>>,
}

impl SearchCache {
    /// Create a cache holding entries for `ttl`. A zero TTL yields a
    /// disabled cache that never stores anything.
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(ttl: Duration, capacity: u64) -> Self {
        if ttl.is_zero() {
            return Self { inner: None };
        }
        let inner = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();
        Self { inner: Some(inner) }
    }

    /// Disabled cache: every lookup misses.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    pub async fn get(&self, key: &CacheKey) -> Option<Vec<SearchResult>> {
        let inner = self.inner.as_ref()?;
        let hit = inner.get(key).await;
        if hit.is_some() {
            debug!(query = %key.query, "search cache hit");
        }
        hit
    }

    pub async fn insert(&self, key: CacheKey, results: Vec<SearchResult>) {
        if let Some(inner) = &self.inner {
            inner.insert(key, results).await;
        }
    }
}
