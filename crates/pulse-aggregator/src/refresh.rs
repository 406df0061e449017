//! Periodic refresh loop.

use pulse_core::error::PulseError;
use pulse_core::types::DashboardSnapshot;
use pulse_monitor::CycleMetrics;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::aggregator::Aggregator;
use crate::overview::MarketOverview;
use crate::publisher::SnapshotPublisher;
use crate::universe::CachedUniverse;

/// Runs universe selection, aggregation and publication on a timer.
pub struct RefreshService {
    universe: CachedUniverse,
    aggregator: Aggregator,
    publisher: Arc<SnapshotPublisher>,
    metrics: Arc<CycleMetrics>,
    interval: Duration,
}

impl RefreshService {
    pub fn new(
        universe: CachedUniverse,
        aggregator: Aggregator,
        publisher: Arc<SnapshotPublisher>,
        metrics: Arc<CycleMetrics>,
        interval: Duration,
    ) -> Self {
        Self {
            universe,
            aggregator,
            publisher,
            metrics,
            interval,
        }
    }

    pub fn publisher(&self) -> &Arc<SnapshotPublisher> {
        &self.publisher
    }

    pub fn metrics(&self) -> &Arc<CycleMetrics> {
        &self.metrics
    }

    /// Run one cycle and publish its snapshot.
    ///
    /// On error nothing is published and the previous snapshot stays current.
    pub async fn run_cycle(&self) -> Result<Arc<DashboardSnapshot>, PulseError> {
        let started = Instant::now();

        let result = async {
            let universe = self.universe.get().await?;
            let snapshot = self.aggregator.aggregate(&universe.symbols()).await?;
            Ok::<_, PulseError>(snapshot)
        }
        .await;

        match result {
            Ok(snapshot) => {
                let elapsed = started.elapsed();
                let overview = MarketOverview::from_snapshot(&snapshot);
                let snapshot = self.publisher.publish(snapshot);
                self.metrics.record_published(snapshot.len(), elapsed);
                info!(
                    cycle = snapshot.cycle(),
                    symbols = overview.symbols,
                    skipped = snapshot.skipped().len(),
                    overbought = overview.overbought,
                    oversold = overview.oversold,
                    avg_volatility = overview.average_volatility,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "cycle published"
                );
                Ok(snapshot)
            }
            Err(e) => {
                self.metrics.record_failed(started.elapsed());
                Err(e)
            }
        }
    }

    /// Refresh until `shutdown` resolves or `max_cycles` cycles have run.
    ///
    /// Ticks that come due while a cycle is running are coalesced into one.
    /// Returns the number of cycles attempted.
    pub async fn run<F>(&self, shutdown: F, max_cycles: Option<u64>) -> u64
    where
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(interval_secs = self.interval.as_secs_f64(), "refresh loop started");
        let mut cycles = 0u64;

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    warn!("shutdown requested during a cycle, abandoning it");
                    break;
                }
                result = self.run_cycle() => {
                    if let Err(e) = result {
                        error!(error = %e, "refresh cycle failed, keeping previous snapshot");
                    }
                }
            }

            cycles += 1;
            if max_cycles.is_some_and(|max| cycles >= max) {
                break;
            }
        }

        info!(cycles, "refresh loop stopped");
        cycles
    }
}
