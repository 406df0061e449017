//! Exchange integrations.
//!
//! [`ExchangeClient`] is the only way the rest of the pipeline talks to an
//! exchange: it wraps a [`pulse_core::MarketDataSource`] with a shared
//! request budget and bounded retries.

mod binance;
mod client;
mod rate_limit;
mod retry;
mod simulated;

pub use binance::{BinanceConfig, BinanceSource, MAX_KLINES};
pub use client::ExchangeClient;
pub use rate_limit::{RateLimit, RateLimiter};
pub use retry::{Backoff, RetryPolicy};
pub use simulated::{Fault, SimulatedSource};
