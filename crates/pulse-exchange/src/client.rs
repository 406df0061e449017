//! Rate-limited, retrying front for a market-data source.

use crate::rate_limit::{RateLimit, RateLimiter};
use crate::retry::RetryPolicy;
use pulse_core::error::{ExchangeError, FetchError};
use pulse_core::traits::MarketDataSource;
use pulse_core::types::{LookbackWindow, MarketInfo, PriceSeries, Symbol};
use std::future::Future;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Exchange client shared by every worker.
///
/// All requests draw from one [`RateLimiter`], each charged the weight its
/// source reports, so concurrency never pushes the pipeline over the
/// exchange's budget. Transient failures are retried up to
/// [`RetryPolicy::max_attempts`]; permanent ones fail immediately, as does a
/// `Retry-After` longer than [`RetryPolicy::max_delay`].
pub struct ExchangeClient {
    source: Arc<dyn MarketDataSource>,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

impl ExchangeClient {
    pub fn new(source: Arc<dyn MarketDataSource>, limit: RateLimit, retry: RetryPolicy) -> Self {
        Self {
            source,
            limiter: RateLimiter::new(limit),
            retry,
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// List markets quoted in `quote`.
    pub async fn list_markets(&self, quote: &str) -> Result<Vec<MarketInfo>, FetchError> {
        let cost = self.source.list_markets_cost();
        let target = format!("markets/{quote}");
        let source = &self.source;
        self.with_retry(&target, cost, move || source.list_markets(quote))
            .await
    }

    /// Fetch and validate the lookback window for `symbol`.
    ///
    /// A response that does not form a regular, strictly increasing series is
    /// treated as malformed and retried like any other transient failure.
    pub async fn fetch_series(
        &self,
        symbol: &Symbol,
        window: LookbackWindow,
    ) -> Result<PriceSeries, FetchError> {
        let target = symbol.to_string();
        let cost = self.source.fetch_ohlcv_cost();
        let source = &self.source;
        self.with_retry(&target, cost, move || async move {
            let bars = source
                .fetch_ohlcv(symbol, window.timeframe, window.bars)
                .await?;
            PriceSeries::new(symbol.clone(), window.timeframe, bars)
                .map_err(|e| ExchangeError::Malformed(e.to_string()))
        })
        .await
    }

    async fn with_retry<T, F, Fut>(&self, request: &str, cost: u32, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ExchangeError>>,
    {
        let mut attempt = 1;
        loop {
            self.limiter.acquire(cost).await;

            let err = match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(request, attempt, "request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !err.is_transient() || attempt >= self.retry.max_attempts {
                return Err(FetchError::new(request, attempt, err));
            }

            let mut delay = self.retry.delay_for(attempt);
            if let Some(retry_after) = err.retry_after() {
                // Waiting out a long ban would stall every worker behind it.
                if retry_after > self.retry.max_delay {
                    warn!(
                        request,
                        attempt,
                        retry_after_secs = retry_after.as_secs(),
                        max_delay_secs = self.retry.max_delay.as_secs(),
                        error = %err,
                        "exchange asked to back off longer than the retry cap, giving up"
                    );
                    return Err(FetchError::new(request, attempt, err));
                }
                delay = delay.max(retry_after);
            }
            warn!(
                request,
                attempt,
                max_attempts = self.retry.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "request failed, retrying"
            );
            sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::Backoff;
    use crate::simulated::{Fault, SimulatedSource};
    use async_trait::async_trait;
    use pulse_core::types::{Bar, Timeframe};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    fn client(source: Arc<SimulatedSource>) -> ExchangeClient {
        ExchangeClient::new(source, RateLimit::per_second(1000), RetryPolicy::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_series_success() {
        let source = Arc::new(SimulatedSource::with_markets(2));
        let client = client(source.clone());
        let symbol = Symbol::new("SIM0", "USDT");

        let series = client
            .fetch_series(&symbol, LookbackWindow::default())
            .await
            .unwrap();

        assert_eq!(series.len(), 168);
        assert_eq!(series.timeframe(), Timeframe::Hour4);
        assert_eq!(source.fetch_count(&symbol), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_is_retried_with_linear_backoff() {
        let symbol = Symbol::new("SIM0", "USDT");
        let source = Arc::new(
            SimulatedSource::with_markets(1).with_fault(symbol.clone(), Fault::FailTimes(2)),
        );
        let client = client(source.clone());
        let start = Instant::now();

        let series = client.fetch_series(&symbol, LookbackWindow::default()).await;

        assert!(series.is_ok());
        assert_eq!(source.fetch_count(&symbol), 3);
        // 1s after the first failure, 2s after the second
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3) && elapsed < Duration::from_millis(3100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_are_bounded() {
        let symbol = Symbol::new("SIM0", "USDT");
        let source = Arc::new(
            SimulatedSource::with_markets(1).with_fault(symbol.clone(), Fault::AlwaysFail),
        );
        let client = client(source.clone());

        let err = client
            .fetch_series(&symbol, LookbackWindow::default())
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 3);
        assert_eq!(err.symbol, "SIM0/USDT");
        assert!(matches!(err.source, ExchangeError::Network(_)));
        assert_eq!(source.fetch_count(&symbol), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_is_not_retried() {
        let source = Arc::new(SimulatedSource::with_markets(1));
        let client = client(source);

        let err = client
            .fetch_series(&Symbol::new("GHOST", "USDT"), LookbackWindow::default())
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 1);
        assert!(matches!(err.source, ExchangeError::SymbolNotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_markets_retries_outage() {
        let source = Arc::new(SimulatedSource::with_markets(4).with_listing_failures(1));
        let client = client(source.clone());

        let markets = client.list_markets("USDT").await.unwrap();
        assert_eq!(markets.len(), 4);
        assert_eq!(source.list_count(), 2);
    }

    /// Source returning bars with a gap on the first call only.
    struct GappySource {
        calls: AtomicU32,
    }

    #[async_trait]
    impl MarketDataSource for GappySource {
        async fn list_markets(&self, _quote: &str) -> Result<Vec<MarketInfo>, ExchangeError> {
            Ok(Vec::new())
        }

        async fn fetch_ohlcv(
            &self,
            _symbol: &Symbol,
            timeframe: Timeframe,
            limit: usize,
        ) -> Result<Vec<Bar>, ExchangeError> {
            let call = self.calls.fetch_add(1, Ordering::Relaxed);
            let step = timeframe.as_millis() as i64;
            Ok((0..limit)
                .map(|i| {
                    let gap = if call == 0 && i > limit / 2 { step } else { 0 };
                    Bar::new(i as i64 * step + gap, 1.0, 1.0, 1.0, 1.0, 1.0)
                })
                .collect())
        }

        fn name(&self) -> &str {
            "Gappy"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_irregular_series_is_retried_as_malformed() {
        let source = Arc::new(GappySource {
            calls: AtomicU32::new(0),
        });
        let client = ExchangeClient::new(
            source.clone(),
            RateLimit::per_second(100),
            RetryPolicy::new(2, Duration::from_millis(10), Backoff::Constant),
        );

        let series = client
            .fetch_series(&Symbol::new("BTC", "USDT"), LookbackWindow::new(Timeframe::Hour1, 20))
            .await
            .unwrap();

        assert_eq!(series.len(), 20);
        assert_eq!(source.calls.load(Ordering::Relaxed), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_share_the_budget() {
        let source = Arc::new(SimulatedSource::with_markets(1));
        let client = ExchangeClient::new(
            source,
            RateLimit::per_second(2),
            RetryPolicy::none(),
        );
        let symbol = Symbol::new("SIM0", "USDT");
        let window = LookbackWindow::new(Timeframe::Hour1, 10);

        for _ in 0..4 {
            client.fetch_series(&symbol, window).await.unwrap();
        }

        assert!(client.limiter().throttled_count() >= 1);
    }

    /// Simulated market that rate-limits the first OHLCV request and charges
    /// a fixed weight per request.
    struct ThrottledSource {
        inner: SimulatedSource,
        retry_after: Option<Duration>,
        weight: u32,
        calls: AtomicU32,
    }

    impl ThrottledSource {
        fn new(retry_after: Option<Duration>, weight: u32) -> Self {
            Self {
                inner: SimulatedSource::with_markets(1),
                retry_after,
                weight,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl MarketDataSource for ThrottledSource {
        async fn list_markets(&self, quote: &str) -> Result<Vec<MarketInfo>, ExchangeError> {
            self.inner.list_markets(quote).await
        }

        async fn fetch_ohlcv(
            &self,
            symbol: &Symbol,
            timeframe: Timeframe,
            limit: usize,
        ) -> Result<Vec<Bar>, ExchangeError> {
            let call = self.calls.fetch_add(1, Ordering::Relaxed);
            if call == 0 && self.retry_after.is_some() {
                return Err(ExchangeError::RateLimited {
                    retry_after: self.retry_after,
                });
            }
            self.inner.fetch_ohlcv(symbol, timeframe, limit).await
        }

        fn fetch_ohlcv_cost(&self) -> u32 {
            self.weight
        }

        fn name(&self) -> &str {
            "Throttled"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_within_cap_is_honored() {
        let source = Arc::new(ThrottledSource::new(Some(Duration::from_secs(5)), 1));
        let client = ExchangeClient::new(source.clone(), RateLimit::per_second(100), RetryPolicy::default());
        let start = Instant::now();

        let series = client
            .fetch_series(&Symbol::new("SIM0", "USDT"), LookbackWindow::new(Timeframe::Hour1, 10))
            .await;

        assert!(series.is_ok());
        assert_eq!(source.calls.load(Ordering::Relaxed), 2);
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_beyond_cap_fails_fast() {
        let source = Arc::new(ThrottledSource::new(Some(Duration::from_secs(3 * 60 * 60)), 1));
        let policy = RetryPolicy::default().with_max_delay(Duration::from_secs(30));
        let client = ExchangeClient::new(source.clone(), RateLimit::per_second(100), policy);
        let start = Instant::now();

        let err = client
            .fetch_series(&Symbol::new("SIM0", "USDT"), LookbackWindow::new(Timeframe::Hour1, 10))
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 1);
        assert!(matches!(err.source, ExchangeError::RateLimited { .. }));
        assert_eq!(source.calls.load(Ordering::Relaxed), 1);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_are_charged_their_weight() {
        let source = Arc::new(ThrottledSource::new(None, 5));
        let client = ExchangeClient::new(source, RateLimit::per_second(100), RetryPolicy::none());
        let window = LookbackWindow::new(Timeframe::Hour1, 10);

        for _ in 0..2 {
            client
                .fetch_series(&Symbol::new("SIM0", "USDT"), window)
                .await
                .unwrap();
        }

        assert!((client.limiter().available().await - 90.0).abs() < 1e-9);
    }
}
