//! Aggregator configuration with sensible defaults.
//!
//! [`AggregatorConfig`] controls which backends are queried, the retry
//! and pacing policy, timeouts, caching, chunking, and provider
//! endpoints. Defaults query DuckDuckGo plus a local Perplexica
//! instance, with Brave present as an unconfigured slot.

use crate::error::AggregatorError;
use crate::types::Backend;

/// Configuration for search aggregation and response assembly.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    /// Which backends to query, in output order. Queried concurrently;
    /// the merged result list preserves this order exactly.
    pub backends: Vec<Backend>,
    /// Maximum rendered result items per backend.
    pub max_items_per_backend: usize,
    /// Maximum retries after the first failed attempt (R).
    pub max_retries: u32,
    /// Fixed delay between retry attempts in milliseconds (D).
    pub retry_delay_ms: u64,
    /// Pacing rate per backend in calls per second.
    pub rate_limit_cps: f64,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
    /// Transport chunk size limit in characters.
    pub chunk_limit: usize,
    /// How long to cache merged results in seconds. 0 disables caching.
    pub cache_ttl_seconds: u64,
    /// Whether to request safe-search filtering where supported.
    pub safe_search: bool,
    /// Custom User-Agent. `None` rotates through a built-in list.
    pub user_agent: Option<String>,
    /// Base URL of the Perplexica instance.
    pub perplexica_url: String,
    /// Base URL of the Brave Search API.
    pub brave_url: String,
    /// Brave subscription token. Brave can only be queried when set.
    pub brave_api_key: Option<String>,
    /// Recency window in days for backends that support date filtering.
    pub recency_days: i64,
    /// Whether formatted responses include the thinking segment.
    pub include_thinking: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            backends: vec![Backend::DuckDuckGo, Backend::Perplexica],
            max_items_per_backend: 5,
            max_retries: 3,
            retry_delay_ms: 1000,
            rate_limit_cps: 1.0,
            timeout_seconds: 10,
            chunk_limit: 4096,
            cache_ttl_seconds: 600,
            safe_search: true,
            user_agent: None,
            perplexica_url: "http://localhost:3001".into(),
            brave_url: "https://api.search.brave.com/res/v1/web".into(),
            brave_api_key: None,
            recency_days: 30,
            include_thinking: false,
        }
    }
}

impl AggregatorConfig {
    /// Validates this configuration, returning an error if any field is
    /// invalid.
    ///
    /// Checks:
    /// - `backends` must not be empty
    /// - `max_items_per_backend` must be greater than 0
    /// - `timeout_seconds` must be greater than 0
    /// - `chunk_limit` must be greater than 0
    /// - `rate_limit_cps` must be finite and greater than 0
    /// - Brave in `backends` requires `brave_api_key`
    pub fn validate(&self) -> Result<(), AggregatorError> {
        if self.backends.is_empty() {
            return Err(AggregatorError::Config(
                "at least one backend must be enabled".into(),
            ));
        }
        if self.max_items_per_backend == 0 {
            return Err(AggregatorError::Config(
                "max_items_per_backend must be greater than 0".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(AggregatorError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.chunk_limit == 0 {
            return Err(AggregatorError::Config(
                "chunk_limit must be greater than 0".into(),
            ));
        }
        if !self.rate_limit_cps.is_finite() || self.rate_limit_cps <= 0.0 {
            return Err(AggregatorError::Config(
                "rate_limit_cps must be a positive finite number".into(),
            ));
        }
        if self.backends.contains(&Backend::Brave) && self.brave_api_key.is_none() {
            return Err(AggregatorError::Config(
                "Brave backend requires brave_api_key".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = AggregatorConfig::default();
        assert_eq!(config.max_items_per_backend, 5);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay_ms, 1000);
        assert_eq!(config.chunk_limit, 4096);
        assert!((config.rate_limit_cps - 1.0).abs() < f64::EPSILON);
        assert!(config.safe_search);
        assert!(config.user_agent.is_none());
        assert!(!config.include_thinking);
    }

    #[test]
    fn default_backends_exclude_brave() {
        let config = AggregatorConfig::default();
        assert_eq!(
            config.backends,
            vec![Backend::DuckDuckGo, Backend::Perplexica]
        );
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(AggregatorConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_backends_rejected() {
        let config = AggregatorConfig {
            backends: vec![],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("backend"));
    }

    #[test]
    fn zero_items_rejected() {
        let config = AggregatorConfig {
            max_items_per_backend: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_items_per_backend"));
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = AggregatorConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_seconds"));
    }

    #[test]
    fn zero_chunk_limit_rejected() {
        let config = AggregatorConfig {
            chunk_limit: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chunk_limit"));
    }

    #[test]
    fn non_positive_rate_rejected() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = AggregatorConfig {
                rate_limit_cps: bad,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "rate {bad} should be rejected");
        }
    }

    #[test]
    fn brave_without_key_rejected() {
        let config = AggregatorConfig {
            backends: vec![Backend::Brave],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("brave_api_key"));
    }

    #[test]
    fn brave_with_key_accepted() {
        let config = AggregatorConfig {
            backends: vec![Backend::DuckDuckGo, Backend::Brave],
            brave_api_key: Some("token".into()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_cache_ttl_is_valid() {
        let config = AggregatorConfig {
            cache_ttl_seconds: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
