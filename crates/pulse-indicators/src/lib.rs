//! Technical indicators for the market pulse pipeline.
//!
//! This crate provides the indicators shown on the dashboard:
//! - Momentum (Wilder RSI)
//! - Price action (percent change, VWAP, support/resistance levels)
//! - Volatility (annualized log-return volatility)
//!
//! [`IndicatorEngine`] combines them into one [`pulse_core::IndicatorSet`]
//! per price series.

pub mod engine;
pub mod momentum;
pub mod price;
pub mod volatility;

pub use engine::{EngineConfig, IndicatorEngine};
pub use momentum::Rsi;
pub use price::{LevelsOutput, PercentChange, PriceLevels, Vwap};
pub use volatility::LogReturnVolatility;
