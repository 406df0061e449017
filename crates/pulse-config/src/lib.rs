//! Configuration management.
//!
//! Settings come from a TOML file overlaid with `PULSE__`-prefixed
//! environment variables, e.g. `PULSE__AGGREGATOR__WORKERS=4`.

mod settings;

pub use settings::{
    AggregatorSettings, AppConfig, AppSettings, ExchangeSettings, IndicatorSettings,
    LoggingConfig, RetrySettings, UniverseSettings,
};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;

fn environment() -> Environment {
    Environment::with_prefix("PULSE")
        .separator("__")
        .try_parsing(true)
}

/// Load configuration from file and environment.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(environment())
        .build()?;

    config.try_deserialize()
}

/// Like [`load_config`], falling back to defaults when `path` does not exist.
pub fn load_config_or_default(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(false))
        .add_source(environment())
        .build()?;

    config.try_deserialize()
}

/// Default configuration rendered as TOML.
pub fn default_config_toml() -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(&AppConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::types::Timeframe;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("pulse-{}-{name}.toml", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_default_toml_round_trips() {
        let rendered = default_config_toml().unwrap();
        assert!(rendered.contains("[universe]"));
        assert!(rendered.contains("quote_asset = \"USDT\""));

        let parsed: AppConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.aggregator.workers, 12);
        assert_eq!(parsed.indicators.timeframe, Timeframe::Hour4);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let path = write_temp(
            "partial",
            r#"
[universe]
max_symbols = 25

[indicators]
timeframe = "1h"
lookback_bars = 240

[exchange.retry]
backoff = "exponential"
"#,
        );

        let config = load_config(&path).unwrap();
        assert_eq!(config.universe.max_symbols, 25);
        assert_eq!(config.universe.quote_asset, "USDT");
        assert_eq!(config.indicators.timeframe, Timeframe::Hour1);
        assert_eq!(config.indicators.lookback_bars, 240);
        assert_eq!(config.indicators.rsi_period, 14);
        assert_eq!(config.exchange.retry.max_attempts, 3);
        assert!(config.validate().is_ok());

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_timeframe_alone_rejected_when_week_not_covered() {
        let path = write_temp(
            "short-week",
            r#"
[indicators]
timeframe = "1h"
"#,
        );

        let config = load_config(&path).unwrap();
        assert_eq!(config.indicators.lookback_bars, 168);
        assert!(config.validate().is_err());

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_file() {
        let path = Path::new("/nonexistent/pulse.toml");
        assert!(load_config(path).is_err());
        let config = load_config_or_default(path).unwrap();
        assert_eq!(config.universe.cache_ttl_secs, 55);
    }
}
