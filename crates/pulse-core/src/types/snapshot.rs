//! Per-symbol indicator output and the published dashboard snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Symbol;

/// Indicators computed for one symbol from a single price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub symbol: Symbol,
    /// Latest close
    pub price: f64,
    /// Wilder RSI, in [0, 100]
    pub rsi: f64,
    /// Percent change over the last 24 hours
    pub change_24h: f64,
    /// Percent change over the last 7 days
    pub change_7d: f64,
    /// Annualized volatility of log returns
    pub volatility: f64,
    /// Volume-weighted average of typical price
    pub vwap: f64,
    pub support: f64,
    pub resistance: f64,
    /// Base volume traded over the last 24 hours
    pub volume_24h: f64,
}

impl IndicatorSet {
    /// Name of the first non-finite field, if any.
    pub fn first_non_finite(&self) -> Option<&'static str> {
        [
            ("price", self.price),
            ("rsi", self.rsi),
            ("change_24h", self.change_24h),
            ("change_7d", self.change_7d),
            ("volatility", self.volatility),
            ("vwap", self.vwap),
            ("support", self.support),
            ("resistance", self.resistance),
            ("volume_24h", self.volume_24h),
        ]
        .into_iter()
        .find(|(_, v)| !v.is_finite())
        .map(|(name, _)| name)
    }

    pub fn is_overbought(&self, threshold: f64) -> bool {
        self.rsi > threshold
    }

    pub fn is_oversold(&self, threshold: f64) -> bool {
        self.rsi < threshold
    }
}

/// A symbol left out of a snapshot and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSymbol {
    pub symbol: Symbol,
    pub reason: String,
}

/// Result of one aggregation cycle.
///
/// Never mutated after construction; consumers share it through an `Arc`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    cycle: u64,
    generated_at: DateTime<Utc>,
    indicators: BTreeMap<Symbol, IndicatorSet>,
    skipped: Vec<SkippedSymbol>,
}

impl DashboardSnapshot {
    pub fn new(
        cycle: u64,
        generated_at: DateTime<Utc>,
        indicators: BTreeMap<Symbol, IndicatorSet>,
        skipped: Vec<SkippedSymbol>,
    ) -> Self {
        Self {
            cycle,
            generated_at,
            indicators,
            skipped,
        }
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn indicators(&self) -> &BTreeMap<Symbol, IndicatorSet> {
        &self.indicators
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&IndicatorSet> {
        self.indicators.get(symbol)
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.indicators.contains_key(symbol)
    }

    pub fn skipped(&self) -> &[SkippedSymbol] {
        &self.skipped
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }
}
