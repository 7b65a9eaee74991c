//! Pacing gate enforcing a minimum interval between backend calls.
//!
//! One [`RateLimiter`] instance paces one backend for the lifetime of
//! the process. The baseline timestamp is guarded by an async mutex
//! held across the wait, so concurrent acquisitions are serialised and
//! can never both observe a stale baseline and proceed unspaced.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum-interval pacing gate for a single logical caller.
///
/// Constructed with a target rate in calls per second; each
/// [`RateLimiter::acquire`] suspends only long enough that the gap
/// since the previous acquisition through this instance is at least
/// `1000 / rate` milliseconds.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter allowing `calls_per_second` acquisitions per second.
    ///
    /// Non-positive or non-finite rates collapse to an effectively
    /// unlimited gate (zero interval).
    pub fn new(calls_per_second: f64) -> Self {
        let interval = if calls_per_second.is_finite() && calls_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / calls_per_second)
        } else {
            Duration::ZERO
        };
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Wait until the configured interval has elapsed since the last
    /// acquisition, then record now as the new baseline.
    ///
    /// The baseline lock is held across the sleep: a second caller
    /// arriving mid-wait queues behind the first and measures its gap
    /// from the updated baseline.
    pub async fn acquire(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// The minimum spacing enforced between acquisitions.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}
