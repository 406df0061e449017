//! Liquid symbol universe selection.

use chrono::Utc;
use pulse_core::error::FetchError;
use pulse_core::types::{MarketInfo, SymbolUniverse};
use pulse_data::TtlCache;
use pulse_exchange::ExchangeClient;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Universe selection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseConfig {
    /// Settlement currency every market must be quoted in
    pub quote_asset: String,
    /// Minimum 24h quote volume (strictly greater than)
    pub min_quote_volume: f64,
    /// Maximum number of symbols kept
    pub max_symbols: usize,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            quote_asset: "USDT".to_string(),
            min_quote_volume: 2_500_000.0,
            max_symbols: 100,
        }
    }
}

/// Filter and rank markets.
///
/// Keeps active markets quoted in the configured asset with enough volume,
/// ordered by descending quote volume (ties by symbol), truncated to
/// `max_symbols`.
pub fn select_markets(markets: Vec<MarketInfo>, config: &UniverseConfig) -> Vec<MarketInfo> {
    let mut selected: Vec<MarketInfo> = markets
        .into_iter()
        .filter(|m| {
            m.active
                && m.symbol.is_quoted_in(&config.quote_asset)
                && m.quote_volume > config.min_quote_volume
        })
        .collect();

    selected.sort_by(|a, b| {
        b.quote_volume
            .partial_cmp(&a.quote_volume)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
    selected.truncate(config.max_symbols);
    selected
}

/// Selects the symbol universe from the exchange.
pub struct UniverseSelector {
    client: Arc<ExchangeClient>,
    config: UniverseConfig,
}

impl UniverseSelector {
    pub fn new(client: Arc<ExchangeClient>, config: UniverseConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &UniverseConfig {
        &self.config
    }

    /// List markets and select the most liquid active ones.
    pub async fn list_active_symbols(&self) -> Result<SymbolUniverse, FetchError> {
        let markets = self.client.list_markets(&self.config.quote_asset).await?;
        let listed = markets.len();
        let selected = select_markets(markets, &self.config);

        info!(
            source = self.client.source_name(),
            listed,
            selected = selected.len(),
            min_quote_volume = self.config.min_quote_volume,
            "symbol universe selected"
        );
        Ok(SymbolUniverse::new(selected, Utc::now()))
    }
}

/// [`UniverseSelector`] memoized for a fixed TTL.
pub struct CachedUniverse {
    selector: UniverseSelector,
    cache: TtlCache<String, Arc<SymbolUniverse>>,
    ttl: Duration,
}

impl CachedUniverse {
    pub fn new(selector: UniverseSelector, ttl: Duration) -> Self {
        Self {
            selector,
            cache: TtlCache::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current universe, from cache while fresh.
    pub async fn get(&self) -> Result<Arc<SymbolUniverse>, FetchError> {
        let key = self.selector.config().quote_asset.clone();
        let universe = self
            .cache
            .get_or_compute(key, self.ttl, move || async move {
                self.selector.list_active_symbols().await.map(Arc::new)
            })
            .await?;
        debug!(symbols = universe.len(), "universe lookup");
        Ok(universe)
    }

    /// Force the next lookup to hit the exchange.
    pub async fn invalidate(&self) {
        let key = self.selector.config().quote_asset.clone();
        self.cache.invalidate(&key).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::types::Symbol;
    use pulse_exchange::{RateLimit, RetryPolicy, SimulatedSource};

    fn market(base: &str, quote: &str, active: bool, volume: f64) -> MarketInfo {
        MarketInfo::new(Symbol::new(base, quote), active, volume, 1.0)
    }

    fn client(source: Arc<SimulatedSource>) -> Arc<ExchangeClient> {
        Arc::new(ExchangeClient::new(
            source,
            RateLimit::per_second(1000),
            RetryPolicy::default(),
        ))
    }

    #[test]
    fn test_select_filters_and_ranks() {
        let markets = vec![
            market("LOW", "USDT", true, 1_000_000.0),
            market("ETH", "USDT", true, 9e8),
            market("DEAD", "USDT", false, 5e9),
            market("BTC", "USDT", true, 2e9),
            market("ETH", "BTC", true, 3e9),
            market("EDGE", "USDT", true, 2_500_000.0),
        ];

        let selected = select_markets(markets, &UniverseConfig::default());
        let symbols: Vec<String> = selected.iter().map(|m| m.symbol.to_string()).collect();
        assert_eq!(symbols, vec!["BTC/USDT", "ETH/USDT"]);
    }

    #[test]
    fn test_ties_are_ordered_by_symbol() {
        let markets = vec![
            market("ZZZ", "USDT", true, 5e6),
            market("AAA", "USDT", true, 5e6),
        ];
        let selected = select_markets(markets, &UniverseConfig::default());
        assert_eq!(selected[0].symbol, Symbol::new("AAA", "USDT"));
    }

    #[test]
    fn test_floor_and_cap() {
        // 110 liquid candidates and 40 below the floor
        let markets: Vec<MarketInfo> = (0..150)
            .map(|i| {
                let volume = if i < 110 {
                    3_000_000.0 + i as f64 * 10_000.0
                } else {
                    1_000_000.0 + i as f64
                };
                market(&format!("C{i}"), "USDT", true, volume)
            })
            .collect();

        let selected = select_markets(markets, &UniverseConfig::default());
        assert_eq!(selected.len(), 100);
        assert!(selected
            .windows(2)
            .all(|w| w[0].quote_volume >= w[1].quote_volume));
        assert!(selected.iter().all(|m| m.quote_volume > 2_500_000.0));
        assert_eq!(selected[0].symbol, Symbol::new("C109", "USDT"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_active_symbols() {
        let source = Arc::new(SimulatedSource::demo());
        let selector = UniverseSelector::new(client(source), UniverseConfig::default());

        let universe = selector.list_active_symbols().await.unwrap();
        let symbols = universe.symbols();

        assert_eq!(symbols[0], Symbol::new("BTC", "USDT"));
        assert!(!symbols.contains(&Symbol::new("LUNC", "USDT")));
        assert!(!symbols.contains(&Symbol::new("MANA", "USDT")));
        assert!(!symbols.contains(&Symbol::new("SAND", "USDT")));
        assert!(symbols.contains(&Symbol::new("ICP", "USDT")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_universe_hits_upstream_once_per_ttl() {
        let source = Arc::new(SimulatedSource::with_markets(5));
        let selector = UniverseSelector::new(client(source.clone()), UniverseConfig::default());
        let cached = CachedUniverse::new(selector, Duration::from_secs(55));

        let first = cached.get().await.unwrap();
        let second = cached.get().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.list_count(), 1);

        tokio::time::advance(Duration::from_secs(56)).await;
        cached.get().await.unwrap();
        assert_eq!(source.list_count(), 2);

        cached.invalidate().await;
        cached.get().await.unwrap();
        assert_eq!(source.list_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_selection_is_not_cached() {
        let source = Arc::new(SimulatedSource::with_markets(3).with_listing_failures(3));
        let selector = UniverseSelector::new(client(source.clone()), UniverseConfig::default());
        let cached = CachedUniverse::new(selector, Duration::from_secs(55));

        assert!(cached.get().await.is_err());
        let universe = cached.get().await.unwrap();
        assert_eq!(universe.len(), 3);
        assert_eq!(source.list_count(), 4);
    }
}
