//! Deterministic in-process market-data source for offline runs and tests.

use async_trait::async_trait;
use chrono::Utc;
use pulse_core::error::ExchangeError;
use pulse_core::traits::MarketDataSource;
use pulse_core::types::{Bar, MarketInfo, Symbol, Timeframe};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// Injected misbehaviour for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Every fetch fails with a network error
    AlwaysFail,
    /// The first `n` fetches fail with a network error
    FailTimes(u32),
    /// Fetches return at most this many bars
    ShortHistory(usize),
}

/// Simulated exchange.
///
/// Prices follow a smooth, symbol-seeded oscillation around a trend so the
/// same symbol always yields the same series shape.
pub struct SimulatedSource {
    markets: Vec<MarketInfo>,
    faults: HashMap<Symbol, Fault>,
    fetch_calls: HashMap<Symbol, AtomicU32>,
    list_calls: AtomicU32,
    listing_failures: AtomicU32,
}

impl SimulatedSource {
    /// Create a source listing the given markets.
    pub fn new(markets: Vec<MarketInfo>) -> Self {
        let fetch_calls = markets
            .iter()
            .map(|m| (m.symbol.clone(), AtomicU32::new(0)))
            .collect();
        Self {
            markets,
            faults: HashMap::new(),
            fetch_calls,
            list_calls: AtomicU32::new(0),
            listing_failures: AtomicU32::new(0),
        }
    }

    /// `count` active USDT markets with strictly decreasing volume,
    /// starting at 1e9.
    pub fn with_markets(count: usize) -> Self {
        let markets = (0..count)
            .map(|i| {
                MarketInfo::new(
                    Symbol::new(format!("SIM{i}"), "USDT"),
                    true,
                    1_000_000_000.0 / (i as f64 + 1.0),
                    10.0 + i as f64,
                )
            })
            .collect();
        Self::new(markets)
    }

    /// A small, realistic-looking spot market used by `--simulate`.
    pub fn demo() -> Self {
        const LISTINGS: &[(&str, f64, f64)] = &[
            ("BTC", 1.9e9, 67_000.0),
            ("ETH", 9.5e8, 3_400.0),
            ("SOL", 4.1e8, 150.0),
            ("BNB", 2.2e8, 580.0),
            ("XRP", 1.8e8, 0.52),
            ("DOGE", 1.5e8, 0.15),
            ("ADA", 7.0e7, 0.45),
            ("AVAX", 6.1e7, 35.0),
            ("LINK", 5.4e7, 14.0),
            ("DOT", 3.3e7, 7.0),
            ("MATIC", 2.9e7, 0.7),
            ("LTC", 2.4e7, 82.0),
            ("ATOM", 1.6e7, 8.5),
            ("NEAR", 1.2e7, 5.8),
            ("APT", 9.0e6, 8.9),
            ("FIL", 6.5e6, 5.6),
            ("ICP", 4.0e6, 12.0),
            ("SAND", 2.0e6, 0.4),
            ("MANA", 1.1e6, 0.38),
        ];

        let mut markets: Vec<MarketInfo> = LISTINGS
            .iter()
            .map(|&(base, volume, price)| {
                MarketInfo::new(Symbol::new(base, "USDT"), true, volume, price)
            })
            .collect();
        markets.push(MarketInfo::new(Symbol::new("LUNC", "USDT"), false, 3.0e7, 0.0001));
        Self::new(markets)
    }

    /// Inject a fault for `symbol`.
    pub fn with_fault(mut self, symbol: Symbol, fault: Fault) -> Self {
        self.fetch_calls
            .entry(symbol.clone())
            .or_insert_with(|| AtomicU32::new(0));
        self.faults.insert(symbol, fault);
        self
    }

    /// Make the next `n` listing calls fail with a network error.
    pub fn with_listing_failures(self, n: u32) -> Self {
        self.listing_failures.store(n, Ordering::Relaxed);
        self
    }

    /// Number of OHLCV fetches made for `symbol`.
    pub fn fetch_count(&self, symbol: &Symbol) -> u32 {
        self.fetch_calls
            .get(symbol)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    /// Number of market listing calls made.
    pub fn list_count(&self) -> u32 {
        self.list_calls.load(Ordering::Relaxed)
    }

    fn seed(symbol: &Symbol) -> f64 {
        // FNV-1a over the display name
        let hash = symbol
            .to_string()
            .bytes()
            .fold(0xcbf29ce484222325u64, |h, b| (h ^ b as u64).wrapping_mul(0x100000001b3));
        (hash % 10_000) as f64 / 10_000.0
    }

    fn generate_bars(&self, symbol: &Symbol, timeframe: Timeframe, limit: usize) -> Vec<Bar> {
        let base_price = self
            .markets
            .iter()
            .find(|m| &m.symbol == symbol)
            .map_or(100.0, |m| m.last_price.max(1e-6));
        let seed = Self::seed(symbol);
        let step = timeframe.as_millis() as i64;
        let last_open = Utc::now().timestamp_millis() / step * step;
        let first_open = last_open - step * (limit.saturating_sub(1)) as i64;
        let drift = (seed - 0.5) * 0.004;

        let close_at = |i: usize| {
            let x = i as f64;
            let wave = (x * (0.11 + seed * 0.2) + seed * 6.28).sin() * 0.04
                + (x * 0.031 + seed).cos() * 0.02;
            base_price * (1.0 + wave) * (1.0 + drift).powf(x - limit as f64)
        };

        (0..limit)
            .map(|i| {
                let open = if i == 0 { close_at(0) } else { close_at(i - 1) };
                let close = close_at(i);
                let high = open.max(close) * 1.004;
                let low = open.min(close) * 0.996;
                let volume = 1_000.0 * (1.5 + (i as f64 * 0.37 + seed * 3.0).sin());
                Bar::new(first_open + step * i as i64, open, high, low, close, volume)
            })
            .collect()
    }
}

#[async_trait]
impl MarketDataSource for SimulatedSource {
    async fn list_markets(&self, quote: &str) -> Result<Vec<MarketInfo>, ExchangeError> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);

        let failing = self
            .listing_failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ExchangeError::Network("simulated listing outage".into()));
        }

        Ok(self
            .markets
            .iter()
            .filter(|m| m.symbol.is_quoted_in(quote))
            .cloned()
            .collect())
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Bar>, ExchangeError> {
        let previous_calls = self
            .fetch_calls
            .get(symbol)
            .map(|c| c.fetch_add(1, Ordering::Relaxed))
            .ok_or_else(|| ExchangeError::SymbolNotFound(symbol.to_string()))?;

        match self.faults.get(symbol) {
            Some(Fault::AlwaysFail) => Err(ExchangeError::Network(format!(
                "simulated outage for {symbol}"
            ))),
            Some(Fault::FailTimes(n)) if previous_calls < *n => Err(ExchangeError::Network(
                format!("simulated transient failure {} for {symbol}", previous_calls + 1),
            )),
            Some(Fault::ShortHistory(max)) => {
                Ok(self.generate_bars(symbol, timeframe, limit.min(*max)))
            }
            _ => Ok(self.generate_bars(symbol, timeframe, limit)),
        }
    }

    fn name(&self) -> &str {
        "Simulated"
    }
}
