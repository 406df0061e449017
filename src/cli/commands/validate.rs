//! Validate configuration command.

use anyhow::Result;
use pulse_config::load_config;
use std::path::Path;

pub async fn run(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("Configuration error: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = config.validate() {
        println!("Configuration error: {}", e);
        return Err(e.into());
    }

    println!("Configuration is valid!");
    println!();
    println!("App: {}", config.app.name);
    println!("Environment: {}", config.app.environment);
    println!("Log level: {}", config.logging.level);
    println!("Exchange: {}", config.exchange.base_url);
    println!(
        "Rate limit: {} requests / {}s",
        config.exchange.rate_limit_requests, config.exchange.rate_limit_window_secs
    );
    println!(
        "Retry: {} attempts, {:?} backoff from {}ms",
        config.exchange.retry.max_attempts,
        config.exchange.retry.backoff,
        config.exchange.retry.base_delay_ms
    );
    println!(
        "Universe: top {} {} markets above {:.0} volume (cached {}s)",
        config.universe.max_symbols,
        config.universe.quote_asset,
        config.universe.min_quote_volume,
        config.universe.cache_ttl_secs
    );
    println!(
        "Lookback: {} x {} bars",
        config.indicators.lookback_bars, config.indicators.timeframe
    );
    println!(
        "Workers: {}, refresh every {}s",
        config.aggregator.workers, config.aggregator.refresh_interval_secs
    );

    Ok(())
}
