//! Rate-limited, bounded, fixed-delay retry around backend operations.
//!
//! The sequence per call: acquire the backend's rate limiter once, then
//! execute; on a transient failure with retries remaining, wait the
//! fixed delay and try again. There is no exponential backoff. Worst
//! case latency is roughly `rate-limit wait + R × (operation latency + D)`.

use std::future::Future;
use std::time::Duration;

use crate::config::AggregatorConfig;
use crate::error::{AggregatorError, Result};
use crate::rate_limit::RateLimiter;
use crate::types::Backend;

/// Bounded fixed-delay retry policy.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum retries after the first failed attempt (R). An
    /// always-failing operation is attempted exactly `R + 1` times.
    pub max_retries: u32,
    /// Fixed delay between attempts (D).
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    /// Build the policy from aggregator configuration.
    pub fn from_config(config: &AggregatorConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

/// Execute `op` for `backend` under rate limiting and bounded retry.
///
/// Only transient errors ([`AggregatorError::is_transient`]) are
/// retried; anything else propagates on the first occurrence. After
/// `max_retries + 1` transient failures the call fails with
/// [`AggregatorError::ExhaustedRetries`] tagged by the backend name and
/// the last underlying message.
pub async fn call_with_retry<T, F, Fut>(
    backend: Backend,
    limiter: &RateLimiter,
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    limiter.acquire().await;

    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                tracing::warn!(
                    backend = %backend,
                    attempt,
                    max = policy.max_retries,
                    error = %err,
                    "backend attempt failed, retrying after fixed delay"
                );
                tokio::time::sleep(policy.delay).await;
            }
            Err(err) if err.is_transient() => {
                return Err(AggregatorError::ExhaustedRetries {
                    backend: backend.name().to_string(),
                    message: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    fn policy(max_retries: u32, delay_ms: u64) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            delay: Duration::from_millis(delay_ms),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_first_attempt() {
        let limiter = RateLimiter::new(100.0);
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let result = call_with_retry(Backend::DuckDuckGo, &limiter, &policy(3, 1000), || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, AggregatorError>("ok")
            }
        })
        .await;

        assert_eq!(result.expect("should succeed"), "ok");
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn k_failures_then_success_makes_k_plus_one_attempts() {
        let limiter = RateLimiter::new(100.0);
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);
        let start = Instant::now();

        let result = call_with_retry(Backend::Perplexica, &limiter, &policy(3, 1000), || {
            let counter = Arc::clone(&counter);
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(AggregatorError::Network("flaky".into()))
                } else {
                    Ok("recovered")
                }
            }
        })
        .await;

        assert_eq!(result.expect("should recover"), "recovered");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        // Two failures inject exactly 2 × D of delay.
        assert_eq!(start.elapsed(), Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_makes_exactly_r_plus_one_attempts() {
        let limiter = RateLimiter::new(100.0);
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let result: Result<()> =
            call_with_retry(Backend::Brave, &limiter, &policy(3, 1000), || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(AggregatorError::Network("still down".into()))
                }
            })
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        match result.unwrap_err() {
            AggregatorError::ExhaustedRetries { backend, message } => {
                assert_eq!(backend, "Brave");
                assert!(message.contains("still down"));
            }
            other => panic!("expected ExhaustedRetries, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_error_is_retried() {
        let limiter = RateLimiter::new(100.0);
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let result = call_with_retry(Backend::Brave, &limiter, &policy(2, 500), || {
            let counter = Arc::clone(&counter);
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Err(AggregatorError::RateLimited("429".into()))
                } else {
                    Ok("after backoff")
                }
            }
        })
        .await;

        assert_eq!(result.expect("should succeed"), "after backoff");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn non_transient_error_propagates_without_retry() {
        let limiter = RateLimiter::new(100.0);
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let result: Result<()> =
            call_with_retry(Backend::DuckDuckGo, &limiter, &policy(3, 1000), || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(AggregatorError::Parse("bad html".into()))
                }
            })
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(AggregatorError::Parse(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_means_single_attempt() {
        let limiter = RateLimiter::new(100.0);
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let result: Result<()> =
            call_with_retry(Backend::DuckDuckGo, &limiter, &policy(0, 1000), || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(AggregatorError::Network("down".into()))
                }
            })
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result,
            Err(AggregatorError::ExhaustedRetries { .. })
        ));
    }

    #[test]
    fn default_policy_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.delay, Duration::from_millis(1000));
    }

    #[test]
    fn policy_from_config() {
        let config = AggregatorConfig {
            max_retries: 5,
            retry_delay_ms: 250,
            ..Default::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.delay, Duration::from_millis(250));
    }
}
