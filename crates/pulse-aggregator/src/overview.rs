//! Market-wide figures derived from a snapshot.

use pulse_core::types::{DashboardSnapshot, IndicatorSet, Symbol};
use serde::{Deserialize, Serialize};

/// RSI above which a symbol counts as overbought.
pub const OVERBOUGHT_RSI: f64 = 70.0;
/// RSI below which a symbol counts as oversold.
pub const OVERSOLD_RSI: f64 = 30.0;

/// A symbol and its percent change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mover {
    pub symbol: Symbol,
    pub change_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOverview {
    pub symbols: usize,
    /// Sum of per-symbol 24h volume
    pub total_volume_24h: f64,
    pub overbought: usize,
    pub oversold: usize,
    pub average_volatility: f64,
    pub top_gainer_24h: Option<Mover>,
    pub top_loser_24h: Option<Mover>,
    pub top_gainer_7d: Option<Mover>,
    pub top_loser_7d: Option<Mover>,
}

impl MarketOverview {
    pub fn from_snapshot(snapshot: &DashboardSnapshot) -> Self {
        let sets: Vec<&IndicatorSet> = snapshot.indicators().values().collect();
        let n = sets.len();

        let average_volatility = if n == 0 {
            0.0
        } else {
            sets.iter().map(|s| s.volatility).sum::<f64>() / n as f64
        };

        Self {
            symbols: n,
            total_volume_24h: sets.iter().map(|s| s.volume_24h).sum(),
            overbought: sets.iter().filter(|s| s.is_overbought(OVERBOUGHT_RSI)).count(),
            oversold: sets.iter().filter(|s| s.is_oversold(OVERSOLD_RSI)).count(),
            average_volatility,
            top_gainer_24h: extreme(&sets, |s| s.change_24h, true),
            top_loser_24h: extreme(&sets, |s| s.change_24h, false),
            top_gainer_7d: extreme(&sets, |s| s.change_7d, true),
            top_loser_7d: extreme(&sets, |s| s.change_7d, false),
        }
    }
}

/// Largest (or smallest) change; the first symbol in order wins ties.
fn extreme(sets: &[&IndicatorSet], change: impl Fn(&IndicatorSet) -> f64, max: bool) -> Option<Mover> {
    sets.iter()
        .copied()
        .reduce(|best, s| {
            let better = if max {
                change(s) > change(best)
            } else {
                change(s) < change(best)
            };
            if better {
                s
            } else {
                best
            }
        })
        .map(|s| Mover {
            symbol: s.symbol.clone(),
            change_pct: change(s),
        })
}
