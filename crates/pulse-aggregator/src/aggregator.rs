//! Fan-out of per-symbol fetch and compute over a fixed worker pool.

use chrono::Utc;
use futures::future::join_all;
use futures::FutureExt;
use pulse_core::error::{AggregationFailure, SymbolError};
use pulse_core::types::{DashboardSnapshot, IndicatorSet, LookbackWindow, SkippedSymbol, Symbol};
use pulse_exchange::ExchangeClient;
use pulse_indicators::IndicatorEngine;
use pulse_monitor::CycleMetrics;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

/// Worker pool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Concurrent worker tasks
    pub workers: usize,
    /// History requested for every symbol
    pub window: LookbackWindow,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            workers: 12,
            window: LookbackWindow::default(),
        }
    }
}

type SymbolOutcome = (Symbol, Result<IndicatorSet, SymbolError>);

struct Shared {
    client: Arc<ExchangeClient>,
    engine: Arc<IndicatorEngine>,
    window: LookbackWindow,
    queue: Mutex<VecDeque<Symbol>>,
}

/// Fetches and computes indicators for a set of symbols concurrently.
pub struct Aggregator {
    client: Arc<ExchangeClient>,
    engine: Arc<IndicatorEngine>,
    config: AggregatorConfig,
    metrics: Arc<CycleMetrics>,
    next_cycle: AtomicU64,
}

impl Aggregator {
    pub fn new(
        client: Arc<ExchangeClient>,
        engine: Arc<IndicatorEngine>,
        config: AggregatorConfig,
        metrics: Arc<CycleMetrics>,
    ) -> Self {
        Self {
            client,
            engine,
            config,
            metrics,
            next_cycle: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Build a snapshot for `symbols`.
    ///
    /// Each symbol is attempted once. Symbols that fail are left out of the
    /// indicator map and listed as skipped; the call only fails when nothing
    /// usable was produced.
    pub async fn aggregate(&self, symbols: &[Symbol]) -> Result<DashboardSnapshot, AggregationFailure> {
        let mut seen = HashSet::new();
        let queue: VecDeque<Symbol> = symbols
            .iter()
            .filter(|s| seen.insert(*s))
            .cloned()
            .collect();

        if queue.is_empty() {
            return Err(AggregationFailure::EmptyUniverse);
        }

        let attempted = queue.len();
        let cycle = self.next_cycle.fetch_add(1, Ordering::Relaxed);
        let workers = self.config.workers.clamp(1, attempted);
        debug!(cycle, attempted, workers, "dispatching symbols");

        let shared = Arc::new(Shared {
            client: Arc::clone(&self.client),
            engine: Arc::clone(&self.engine),
            window: self.config.window,
            queue: Mutex::new(queue),
        });
        let (tx, mut rx) = mpsc::channel::<SymbolOutcome>(attempted);

        let handles: Vec<_> = (0..workers)
            .map(|id| tokio::spawn(worker(id, Arc::clone(&shared), tx.clone())))
            .collect();
        drop(tx);

        let mut indicators = BTreeMap::new();
        let mut skipped = Vec::new();
        let (mut fetch_failures, mut indicator_failures, mut aborted) = (0u64, 0u64, 0u64);

        while let Some((symbol, outcome)) = rx.recv().await {
            match outcome {
                Ok(set) => {
                    indicators.insert(symbol, set);
                }
                Err(err) => {
                    match &err {
                        SymbolError::Fetch(_) => fetch_failures += 1,
                        SymbolError::Indicator { .. } => indicator_failures += 1,
                        SymbolError::Aborted { .. } => aborted += 1,
                    }
                    warn!(cycle, symbol = %symbol, error = %err, "symbol skipped");
                    skipped.push(SkippedSymbol {
                        symbol,
                        reason: err.to_string(),
                    });
                }
            }
        }

        for result in join_all(handles).await {
            if let Err(e) = result {
                error!(cycle, error = %e, "aggregation worker terminated abnormally");
            }
        }

        // Symbols still queued when every worker died.
        let stranded: Vec<Symbol> = shared.queue.lock().await.drain(..).collect();
        for symbol in stranded {
            aborted += 1;
            skipped.push(SkippedSymbol {
                reason: format!("worker for {symbol} aborted: no worker left to process it"),
                symbol,
            });
        }

        self.metrics
            .record_symbols(indicators.len() as u64, fetch_failures, indicator_failures, aborted);

        if indicators.is_empty() {
            return Err(AggregationFailure::NoUsableSymbols {
                attempted,
                fetch_failures: fetch_failures as usize,
                indicator_failures: indicator_failures as usize,
                aborted: aborted as usize,
            });
        }

        skipped.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        info!(
            cycle,
            computed = indicators.len(),
            skipped = skipped.len(),
            "aggregation complete"
        );
        Ok(DashboardSnapshot::new(cycle, Utc::now(), indicators, skipped))
    }
}

async fn worker(id: usize, shared: Arc<Shared>, tx: mpsc::Sender<SymbolOutcome>) {
    loop {
        let next = shared.queue.lock().await.pop_front();
        let Some(symbol) = next else { break };

        let outcome = AssertUnwindSafe(process(&shared, &symbol))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(SymbolError::Aborted {
                    symbol: symbol.to_string(),
                    reason: panic_message(panic.as_ref()),
                })
            });

        if tx.send((symbol, outcome)).await.is_err() {
            break;
        }
    }
    debug!(worker = id, "queue drained");
}

async fn process(shared: &Shared, symbol: &Symbol) -> Result<IndicatorSet, SymbolError> {
    let series = shared.client.fetch_series(symbol, shared.window).await?;
    shared
        .engine
        .compute(&series)
        .map_err(|source| SymbolError::Indicator {
            symbol: symbol.to_string(),
            source,
        })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
