//! Core data types for the market pulse pipeline.

mod market;
mod ohlcv;
mod snapshot;
mod symbol;
mod timeframe;

pub use market::{MarketInfo, SymbolUniverse};
pub use ohlcv::{Bar, LookbackWindow, PriceSeries};
pub use snapshot::{DashboardSnapshot, IndicatorSet, SkippedSymbol};
pub use symbol::Symbol;
pub use timeframe::Timeframe;
