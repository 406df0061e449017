//! Configuration structures.

use config::ConfigError;
use pulse_aggregator::{AggregatorConfig, UniverseConfig};
use pulse_core::types::{LookbackWindow, Timeframe};
use pulse_exchange::{Backoff, BinanceConfig, RateLimit, RetryPolicy, MAX_KLINES};
use pulse_indicators::{EngineConfig, IndicatorEngine};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub exchange: ExchangeSettings,
    #[serde(default)]
    pub universe: UniverseSettings,
    #[serde(default)]
    pub indicators: IndicatorSettings,
    #[serde(default)]
    pub aggregator: AggregatorSettings,
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "market-pulse".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// Exchange access settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeSettings {
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Request budget per window
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub retry: RetrySettings,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.com".to_string(),
            request_timeout_secs: 10,
            rate_limit_requests: 1200,
            rate_limit_window_secs: 60,
            retry: RetrySettings::default(),
        }
    }
}

impl ExchangeSettings {
    pub fn binance_config(&self) -> BinanceConfig {
        BinanceConfig::new(
            self.base_url.clone(),
            Duration::from_secs(self.request_timeout_secs),
        )
    }

    pub fn rate_limit(&self) -> RateLimit {
        RateLimit::new(
            self.rate_limit_requests,
            Duration::from_secs(self.rate_limit_window_secs),
        )
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            Duration::from_millis(self.retry.base_delay_ms),
            self.retry.backoff,
        )
        .with_max_delay(Duration::from_millis(self.retry.max_delay_ms))
    }
}

/// Retry schedule for transient upstream failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff: Backoff,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff: Backoff::Linear,
        }
    }
}

/// Symbol universe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseSettings {
    pub quote_asset: String,
    pub min_quote_volume: f64,
    pub max_symbols: usize,
    pub cache_ttl_secs: u64,
}

impl Default for UniverseSettings {
    fn default() -> Self {
        let selection = UniverseConfig::default();
        Self {
            quote_asset: selection.quote_asset,
            min_quote_volume: selection.min_quote_volume,
            max_symbols: selection.max_symbols,
            cache_ttl_secs: 55,
        }
    }
}

impl UniverseSettings {
    pub fn selection(&self) -> UniverseConfig {
        UniverseConfig {
            quote_asset: self.quote_asset.clone(),
            min_quote_volume: self.min_quote_volume,
            max_symbols: self.max_symbols,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Indicator and lookback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSettings {
    pub timeframe: Timeframe,
    pub lookback_bars: usize,
    pub rsi_period: usize,
    pub min_bars: usize,
    pub level_window: Option<usize>,
    pub level_percentile: Option<usize>,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        let window = LookbackWindow::default();
        let engine = EngineConfig::default();
        Self {
            timeframe: window.timeframe,
            lookback_bars: window.bars,
            rsi_period: engine.rsi_period,
            min_bars: engine.min_bars,
            level_window: engine.level_window,
            level_percentile: engine.level_percentile,
        }
    }
}

impl IndicatorSettings {
    pub fn window(&self) -> LookbackWindow {
        LookbackWindow::new(self.timeframe, self.lookback_bars)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            rsi_period: self.rsi_period,
            min_bars: self.min_bars,
            level_window: self.level_window,
            level_percentile: self.level_percentile,
        }
    }
}

/// Worker pool and refresh settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorSettings {
    pub workers: usize,
    pub refresh_interval_secs: u64,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            workers: AggregatorConfig::default().workers,
            refresh_interval_secs: 10,
        }
    }
}

impl AggregatorSettings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

impl AppConfig {
    /// Worker pool configuration for the configured lookback window.
    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            workers: self.aggregator.workers,
            window: self.indicators.window(),
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Message(msg));

        if self.aggregator.workers == 0 {
            return invalid("aggregator.workers must be greater than 0".into());
        }
        if self.aggregator.refresh_interval_secs == 0 {
            return invalid("aggregator.refresh_interval_secs must be greater than 0".into());
        }
        if self.universe.max_symbols == 0 {
            return invalid("universe.max_symbols must be greater than 0".into());
        }
        if self.universe.quote_asset.trim().is_empty() {
            return invalid("universe.quote_asset must not be empty".into());
        }
        if !self.universe.min_quote_volume.is_finite() || self.universe.min_quote_volume < 0.0 {
            return invalid("universe.min_quote_volume must be a non-negative number".into());
        }
        if self.exchange.rate_limit_requests == 0 || self.exchange.rate_limit_window_secs == 0 {
            return invalid("exchange rate limit must allow at least one request per non-zero window".into());
        }
        if self.exchange.retry.max_attempts == 0 {
            return invalid("exchange.retry.max_attempts must be at least 1".into());
        }
        if self.indicators.timeframe.as_secs() > Timeframe::Daily.as_secs() {
            return invalid(format!(
                "indicators.timeframe {} is longer than a day; 24h change cannot be computed",
                self.indicators.timeframe
            ));
        }
        if self.indicators.lookback_bars > MAX_KLINES {
            return invalid(format!(
                "indicators.lookback_bars ({}) exceeds the {MAX_KLINES} bars one request can return",
                self.indicators.lookback_bars
            ));
        }
        if !matches!(self.logging.format.to_ascii_lowercase().as_str(), "pretty" | "json") {
            return invalid(format!(
                "logging.format must be 'pretty' or 'json', got '{}'",
                self.logging.format
            ));
        }

        let engine = IndicatorEngine::new(self.indicators.engine_config())
            .map_err(|e| ConfigError::Message(format!("indicators: {e}")))?;
        let needed = engine.bars_needed(self.indicators.timeframe);
        if self.indicators.lookback_bars < needed {
            return invalid(format!(
                "indicators.lookback_bars ({}) is too short for {} bars; at least {needed} are needed to cover 7 days",
                self.indicators.lookback_bars, self.indicators.timeframe
            ));
        }

        Ok(())
    }
}
