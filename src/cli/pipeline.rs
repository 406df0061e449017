//! Wiring of the aggregation pipeline from configuration.

use anyhow::{Context, Result};
use pulse_aggregator::{
    Aggregator, CachedUniverse, RefreshService, SnapshotPublisher, UniverseSelector,
};
use pulse_config::{load_config_or_default, AppConfig};
use pulse_core::error::PulseError;
use pulse_core::traits::MarketDataSource;
use pulse_exchange::{BinanceSource, ExchangeClient, SimulatedSource};
use pulse_indicators::IndicatorEngine;
use pulse_monitor::CycleMetrics;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Load and validate configuration.
pub fn load(config_path: &Path) -> Result<AppConfig> {
    let config = load_config_or_default(config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;
    config
        .validate()
        .map_err(|e| PulseError::Config(e.to_string()))?;
    Ok(config)
}

/// Binance, or the simulated exchange when `simulate` is set.
pub fn source(config: &AppConfig, simulate: bool) -> Result<Arc<dyn MarketDataSource>> {
    if simulate {
        info!("using simulated exchange");
        return Ok(Arc::new(SimulatedSource::demo()));
    }
    let source = BinanceSource::new(config.exchange.binance_config())
        .context("Failed to create Binance client")?;
    info!(base_url = %config.exchange.base_url, "using Binance");
    Ok(Arc::new(source))
}

pub fn client(config: &AppConfig, simulate: bool) -> Result<Arc<ExchangeClient>> {
    Ok(Arc::new(ExchangeClient::new(
        source(config, simulate)?,
        config.exchange.rate_limit(),
        config.exchange.retry_policy(),
    )))
}

pub fn selector(config: &AppConfig, client: Arc<ExchangeClient>) -> UniverseSelector {
    UniverseSelector::new(client, config.universe.selection())
}

/// Full refresh service with a fresh publisher and metrics.
pub fn refresh_service(config: &AppConfig, simulate: bool) -> Result<RefreshService> {
    let client = client(config, simulate)?;
    let engine = IndicatorEngine::new(config.indicators.engine_config())
        .context("Invalid indicator settings")?;
    let metrics = Arc::new(CycleMetrics::new());

    let universe = CachedUniverse::new(
        selector(config, Arc::clone(&client)),
        config.universe.cache_ttl(),
    );
    let aggregator = Aggregator::new(
        client,
        Arc::new(engine),
        config.aggregator_config(),
        Arc::clone(&metrics),
    );

    Ok(RefreshService::new(
        universe,
        aggregator,
        Arc::new(SnapshotPublisher::new()),
        metrics,
        config.aggregator.refresh_interval(),
    ))
}
