//! Market listings and the selected symbol universe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Symbol;

/// A market listed on the exchange with its 24h activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketInfo {
    /// Trading pair
    pub symbol: Symbol,
    /// Whether the market is currently trading
    pub active: bool,
    /// 24h traded volume in quote currency
    pub quote_volume: f64,
    /// Last traded price
    pub last_price: f64,
}

impl MarketInfo {
    pub fn new(symbol: Symbol, active: bool, quote_volume: f64, last_price: f64) -> Self {
        Self {
            symbol,
            active,
            quote_volume,
            last_price,
        }
    }
}

/// The liquid subset of markets selected for one or more aggregation cycles.
///
/// Markets are ordered by descending quote volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolUniverse {
    markets: Vec<MarketInfo>,
    selected_at: DateTime<Utc>,
}

impl SymbolUniverse {
    pub fn new(markets: Vec<MarketInfo>, selected_at: DateTime<Utc>) -> Self {
        Self {
            markets,
            selected_at,
        }
    }

    pub fn markets(&self) -> &[MarketInfo] {
        &self.markets
    }

    /// Symbols in volume order.
    pub fn symbols(&self) -> Vec<Symbol> {
        self.markets.iter().map(|m| m.symbol.clone()).collect()
    }

    pub fn selected_at(&self) -> DateTime<Utc> {
        self.selected_at
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.markets.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}
