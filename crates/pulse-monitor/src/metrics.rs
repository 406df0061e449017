//! Counters describing refresh cycle health.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Lock-free cycle counters shared between the refresh loop and readers.
#[derive(Debug, Default)]
pub struct CycleMetrics {
    cycles_published: AtomicU64,
    cycles_failed: AtomicU64,
    symbols_computed: AtomicU64,
    fetch_failures: AtomicU64,
    indicator_failures: AtomicU64,
    aborted_workers: AtomicU64,
    last_cycle_ms: AtomicU64,
    last_published_symbols: AtomicU64,
}

/// Point-in-time copy of [`CycleMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub cycles_published: u64,
    pub cycles_failed: u64,
    pub symbols_computed: u64,
    pub fetch_failures: u64,
    pub indicator_failures: u64,
    pub aborted_workers: u64,
    pub last_cycle_ms: u64,
    pub last_published_symbols: u64,
}

impl MetricsSnapshot {
    /// Share of cycles that produced a snapshot.
    pub fn success_rate(&self) -> f64 {
        let total = self.cycles_published + self.cycles_failed;
        if total == 0 {
            return 0.0;
        }
        self.cycles_published as f64 / total as f64
    }
}

impl CycleMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count per-symbol outcomes of one cycle.
    pub fn record_symbols(&self, computed: u64, fetch_failures: u64, indicator_failures: u64, aborted: u64) {
        self.symbols_computed.fetch_add(computed, Ordering::Relaxed);
        self.fetch_failures.fetch_add(fetch_failures, Ordering::Relaxed);
        self.indicator_failures
            .fetch_add(indicator_failures, Ordering::Relaxed);
        self.aborted_workers.fetch_add(aborted, Ordering::Relaxed);
    }

    pub fn record_published(&self, symbols: usize, elapsed: Duration) {
        self.cycles_published.fetch_add(1, Ordering::Relaxed);
        self.last_published_symbols
            .store(symbols as u64, Ordering::Relaxed);
        self.last_cycle_ms
            .store(elapsed.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_failed(&self, elapsed: Duration) {
        self.cycles_failed.fetch_add(1, Ordering::Relaxed);
        self.last_cycle_ms
            .store(elapsed.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles_published: self.cycles_published.load(Ordering::Relaxed),
            cycles_failed: self.cycles_failed.load(Ordering::Relaxed),
            symbols_computed: self.symbols_computed.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            indicator_failures: self.indicator_failures.load(Ordering::Relaxed),
            aborted_workers: self.aborted_workers.load(Ordering::Relaxed),
            last_cycle_ms: self.last_cycle_ms.load(Ordering::Relaxed),
            last_published_symbols: self.last_published_symbols.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = CycleMetrics::new();
        metrics.record_symbols(8, 1, 1, 0);
        metrics.record_published(8, Duration::from_millis(420));
        metrics.record_symbols(0, 10, 0, 0);
        metrics.record_failed(Duration::from_millis(900));

        let snap = metrics.snapshot();
        assert_eq!(snap.cycles_published, 1);
        assert_eq!(snap.cycles_failed, 1);
        assert_eq!(snap.symbols_computed, 8);
        assert_eq!(snap.fetch_failures, 11);
        assert_eq!(snap.last_cycle_ms, 900);
        assert_eq!(snap.last_published_symbols, 8);
        assert!((snap.success_rate() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_snapshot_serializes() {
        let snap = CycleMetrics::new().snapshot();
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"cycles_published\":0"));
        assert_eq!(snap.success_rate(), 0.0);
    }
}
