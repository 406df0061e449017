//! Upstream market-data source trait.

use crate::error::ExchangeError;
use crate::types::{Bar, MarketInfo, Symbol, Timeframe};
use async_trait::async_trait;

/// A remote (or simulated) market-data API.
///
/// Implementations perform exactly one upstream request per call; rate
/// limiting and retries are layered on top by the exchange client.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// List every market quoted in `quote` with its 24h activity.
    ///
    /// Inactive markets are included with `active = false`.
    async fn list_markets(&self, quote: &str) -> Result<Vec<MarketInfo>, ExchangeError>;

    /// Fetch the most recent `limit` bars for a symbol, oldest first.
    async fn fetch_ohlcv(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Bar>, ExchangeError>;

    /// Rate-limit budget consumed by one `list_markets` call.
    fn list_markets_cost(&self) -> u32 {
        1
    }

    /// Rate-limit budget consumed by one `fetch_ohlcv` call.
    fn fetch_ohlcv_cost(&self) -> u32 {
        1
    }

    /// Get the source name.
    fn name(&self) -> &str;
}
