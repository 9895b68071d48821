use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use governor::{DefaultDirectRateLimiter, Quota};

/// Process-wide gate in front of the completion provider.
///
/// Admits at most one outbound call per `min_interval`, across every caller
/// that shares the instance. The GCRA state is updated atomically, so two
/// concurrent callers can never both be admitted inside one interval.
pub struct RateLimiter {
    gate: Option<DefaultDirectRateLimiter>,
    min_interval: Duration,
    last_admitted: Mutex<Option<DateTime<Utc>>>,
}

impl RateLimiter {
    /// A zero interval disables throttling.
    pub fn new(min_interval: Duration) -> Self {
        let gate = Quota::with_period(min_interval).map(DefaultDirectRateLimiter::direct);
        Self {
            gate,
            min_interval,
            last_admitted: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Suspends until the caller may issue its request.
    pub async fn acquire(&self) {
        if let Some(gate) = &self.gate {
            gate.until_ready().await;
        }
        if let Ok(mut last) = self.last_admitted.lock() {
            *last = Some(Utc::now());
        }
    }

    /// Wall-clock time of the most recently admitted call.
    pub fn last_admitted(&self) -> Option<DateTime<Utc>> {
        self.last_admitted.lock().ok().and_then(|last| *last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    // governor measures with its own clock; allow for sub-millisecond drift
    const SLACK: Duration = Duration::from_millis(2);

    #[tokio::test]
    async fn sequential_calls_are_spaced() {
        let interval = Duration::from_millis(60);
        let limiter = RateLimiter::new(interval);

        let start = Instant::now();
        for _ in 0..4 {
            limiter.acquire().await;
        }

        assert!(start.elapsed() + SLACK >= interval * 3);
        assert!(limiter.last_admitted().is_some());
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_gate() {
        let interval = Duration::from_millis(50);
        let limiter = Arc::new(RateLimiter::new(interval));

        let start = Instant::now();
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(start.elapsed() + SLACK >= interval * 2);
    }

    #[tokio::test]
    async fn zero_interval_never_waits() {
        let limiter = RateLimiter::new(Duration::ZERO);
        assert!(limiter.last_admitted().is_none());

        let start = Instant::now();
        for _ in 0..10 {
            limiter.acquire().await;
        }

        assert!(start.elapsed() < Duration::from_millis(500));
        assert_eq!(limiter.min_interval(), Duration::ZERO);
    }
}
