use std::num::NonZeroU32;
use std::time::Duration;

use governor::{
    clock::Clock,
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
    Quota,
};

/// Paces calls to a rate-limited upstream
#[async_trait::async_trait]
pub trait RateLimiter: Send + Sync {
    /// Waits until one more call is allowed
    async fn acquire(&self);
}

/// Limiter that never waits
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLimiter;

#[async_trait::async_trait]
impl RateLimiter for NoopLimiter {
    async fn acquire(&self) {}
}

/// Reads time from the tokio clock so paused test time drives the quota
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

impl Clock for TokioClock {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        tokio::time::Instant::now().into_std()
    }
}

type DirectLimiter =
    governor::RateLimiter<NotKeyed, InMemoryState, TokioClock, NoOpMiddleware<std::time::Instant>>;

/// GCRA quota: up to `burst` calls at once, one more per `period`
///
/// A zero period disables pacing.
pub struct QuotaLimiter {
    limiter: Option<DirectLimiter>,
    clock: TokioClock,
}

impl QuotaLimiter {
    pub fn new(burst: u32, period: Duration) -> Self {
        let burst = NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN);
        let clock = TokioClock;
        let limiter = Quota::with_period(period)
            .map(|quota| governor::RateLimiter::direct_with_clock(quota.allow_burst(burst), clock));

        Self { limiter, clock }
    }

    /// One call per `interval`, the first one immediately
    pub fn per_interval(interval: Duration) -> Self {
        Self::new(1, interval)
    }
}

#[async_trait::async_trait]
impl RateLimiter for QuotaLimiter {
    async fn acquire(&self) {
        let Some(limiter) = &self.limiter else {
            return;
        };

        while let Err(not_until) = limiter.check() {
            let wait = not_until.wait_time_from(self.clock.now());
            tracing::trace!(wait_ms = wait.as_millis() as u64, "Rate limiter waiting");
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_first_permit_is_immediate() {
        let limiter = QuotaLimiter::per_interval(Duration::from_millis(500));
        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_are_spaced_by_interval() {
        let limiter = QuotaLimiter::per_interval(Duration::from_millis(500));
        let start = Instant::now();

        for _ in 0..3 {
            limiter.acquire().await;
        }

        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert!(start.elapsed() < Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_allows_back_to_back_calls() {
        let limiter = QuotaLimiter::new(3, Duration::from_secs(1));
        let start = Instant::now();

        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);

        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_time_restores_permits() {
        let limiter = QuotaLimiter::per_interval(Duration::from_millis(500));
        limiter.acquire().await;

        tokio::time::sleep(Duration::from_secs(2)).await;

        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_never_waits() {
        let limiter = QuotaLimiter::per_interval(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..10 {
            limiter.acquire().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_burst_is_treated_as_one() {
        let limiter = QuotaLimiter::new(0, Duration::from_millis(200));
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_noop_limiter() {
        NoopLimiter.acquire().await;
    }
}
