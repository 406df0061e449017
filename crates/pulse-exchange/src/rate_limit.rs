//! Request budget shared by every upstream call.
//!
//! A token bucket holding `requests` tokens, refilled continuously at
//! `requests / per`. Callers wait for a token instead of being rejected, so
//! the budget shapes traffic rather than dropping it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Fixed request budget per unit of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    /// Requests allowed per window (also the burst size)
    pub requests: u32,
    /// Window length
    pub per: Duration,
}

impl RateLimit {
    pub fn new(requests: u32, per: Duration) -> Self {
        assert!(requests > 0, "Request budget must be greater than 0");
        assert!(!per.is_zero(), "Rate-limit window must be non-zero");
        Self { requests, per }
    }

    pub fn per_second(requests: u32) -> Self {
        Self::new(requests, Duration::from_secs(1))
    }

    pub fn per_minute(requests: u32) -> Self {
        Self::new(requests, Duration::from_secs(60))
    }

    fn refill_per_sec(&self) -> f64 {
        self.requests as f64 / self.per.as_secs_f64()
    }
}

impl Default for RateLimit {
    fn default() -> Self {
        // Binance spot request-weight ceiling.
        Self::per_minute(1200)
    }
}

#[derive(Debug)]
struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(limit: RateLimit) -> Self {
        Self {
            capacity: limit.requests as f64,
            tokens: limit.requests as f64,
            refill_per_sec: limit.refill_per_sec(),
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    /// Take `cost` tokens, or report how long until they are available.
    fn try_acquire(&mut self, cost: f64, now: Instant) -> Result<(), Duration> {
        self.refill(now);
        if self.tokens >= cost {
            self.tokens -= cost;
            Ok(())
        } else {
            let missing = cost - self.tokens;
            Err(Duration::from_secs_f64(missing / self.refill_per_sec))
        }
    }
}

/// Async token-bucket rate limiter.
#[derive(Debug)]
pub struct RateLimiter {
    limit: RateLimit,
    bucket: Mutex<TokenBucket>,
    throttled: AtomicU64,
}

impl RateLimiter {
    pub fn new(limit: RateLimit) -> Self {
        Self {
            limit,
            bucket: Mutex::new(TokenBucket::new(limit)),
            throttled: AtomicU64::new(0),
        }
    }

    pub fn limit(&self) -> RateLimit {
        self.limit
    }

    /// Wait until `cost` request tokens are available and take them.
    ///
    /// Costs above the bucket size are clamped to the bucket size.
    pub async fn acquire(&self, cost: u32) {
        let cost = (cost.max(1) as f64).min(self.limit.requests as f64);
        loop {
            let wait = {
                let mut bucket = self.bucket.lock().await;
                match bucket.try_acquire(cost, Instant::now()) {
                    Ok(()) => return,
                    Err(wait) => wait,
                }
            };

            self.throttled.fetch_add(1, Ordering::Relaxed);
            debug!(
                wait_ms = wait.as_millis() as u64,
                cost, "request budget exhausted, waiting for refill"
            );
            sleep(wait).await;
        }
    }

    /// Tokens currently available (after refill).
    pub async fn available(&self) -> f64 {
        let mut bucket = self.bucket.lock().await;
        bucket.refill(Instant::now());
        bucket.tokens
    }

    /// Number of times a caller had to wait for the budget.
    pub fn throttled_count(&self) -> u64 {
        self.throttled.load(Ordering::Relaxed)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimit::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_within_budget_does_not_wait() {
        let limiter = RateLimiter::new(RateLimit::per_second(5));
        let start = Instant::now();

        for _ in 0..5 {
            limiter.acquire(1).await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.throttled_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_over_budget_waits_for_refill() {
        let limiter = RateLimiter::new(RateLimit::per_second(2));
        let start = Instant::now();

        limiter.acquire(1).await;
        limiter.acquire(1).await;
        limiter.acquire(1).await;

        assert!(start.elapsed() >= Duration::from_millis(499));
        assert!(limiter.throttled_count() >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refills_up_to_capacity() {
        let limiter = RateLimiter::new(RateLimit::per_second(4));
        limiter.acquire(4).await;
        assert!(limiter.available().await < 1.0);

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!((limiter.available().await - 4.0).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_cost_is_clamped() {
        let limiter = RateLimiter::new(RateLimit::per_second(2));
        limiter.acquire(10).await;
        assert!(limiter.available().await < 1.0);
    }
}
