//! Per-symbol indicator engine.

use pulse_core::error::IndicatorError;
use pulse_core::traits::Indicator;
use pulse_core::types::{IndicatorSet, PriceSeries, Timeframe};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{LogReturnVolatility, PercentChange, PriceLevels, Rsi, Vwap};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);
const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Indicator engine parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// RSI smoothing period
    pub rsi_period: usize,
    /// Shortest series the engine accepts at all
    pub min_bars: usize,
    /// Trailing bars used for support/resistance (whole series if unset)
    pub level_window: Option<usize>,
    /// Percentile for support/resistance (min/max close if unset)
    pub level_percentile: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            min_bars: 50,
            level_window: None,
            level_percentile: None,
        }
    }
}

/// Computes an [`IndicatorSet`] from a [`PriceSeries`].
///
/// The engine is stateless between calls and safe to share across workers.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    config: EngineConfig,
    rsi: Rsi,
    levels: PriceLevels,
    vwap: Vwap,
}

impl IndicatorEngine {
    /// Create an engine, rejecting parameters the indicators cannot use.
    pub fn new(config: EngineConfig) -> Result<Self, IndicatorError> {
        if config.rsi_period == 0 {
            return Err(IndicatorError::InvalidParameter(
                "rsi_period must be greater than 0".into(),
            ));
        }

        let mut levels = PriceLevels::new();
        match config.level_window {
            Some(0) => {
                return Err(IndicatorError::InvalidParameter(
                    "level_window must be greater than 0".into(),
                ))
            }
            Some(window) => levels = levels.with_window(window),
            None => {}
        }
        match config.level_percentile {
            Some(p) if p >= 50 => {
                return Err(IndicatorError::InvalidParameter(format!(
                    "level_percentile must be below 50, got {p}"
                )))
            }
            Some(p) => levels = levels.with_percentile(p),
            None => {}
        }

        Ok(Self {
            rsi: Rsi::new(config.rsi_period),
            levels,
            vwap: Vwap::new(),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Bars required before any metric is attempted.
    pub fn min_required(&self) -> usize {
        self.config.min_bars.max(self.rsi.period())
    }

    /// Shortest series of `timeframe` bars for which every metric,
    /// including the 7d change, can be computed.
    pub fn bars_needed(&self, timeframe: Timeframe) -> usize {
        self.min_required()
            .max(self.rsi.period() + 1)
            .max(timeframe.bars_in(WEEK) + 1)
    }

    /// Compute every indicator from the same series.
    ///
    /// Fails instead of returning non-finite values.
    pub fn compute(&self, series: &PriceSeries) -> Result<IndicatorSet, IndicatorError> {
        let required = self.min_required();
        if series.len() < required {
            return Err(IndicatorError::InsufficientHistory {
                metric: "series",
                required,
                available: series.len(),
            });
        }

        let timeframe = series.timeframe();
        let day_bars = timeframe.bars_in(DAY);
        let week_bars = timeframe.bars_in(WEEK);
        if day_bars == 0 {
            return Err(IndicatorError::InvalidParameter(format!(
                "timeframe {timeframe} is longer than one day"
            )));
        }

        let closes = series.closes();
        let price = *closes.last().ok_or(IndicatorError::InsufficientHistory {
            metric: "price",
            required: 1,
            available: 0,
        })?;

        let rsi = self.rsi.latest(&closes)?;
        let change_24h = PercentChange::new(day_bars)
            .latest(&closes)
            .map_err(|e| rename_metric(e, "change_24h"))?;
        let change_7d = PercentChange::new(week_bars)
            .latest(&closes)
            .map_err(|e| rename_metric(e, "change_7d"))?;
        let volatility = LogReturnVolatility::new(timeframe.periods_per_year()).latest(&closes)?;

        let vwap = self
            .vwap
            .calculate(&series.typical_prices(), &series.volumes())
            .ok_or(IndicatorError::NonFinite { metric: "vwap" })?;
        let levels = self
            .levels
            .calculate(&closes)
            .ok_or(IndicatorError::NonFinite { metric: "support" })?;
        let volume_24h = series.last_n(day_bars).iter().map(|b| b.volume).sum();

        let set = IndicatorSet {
            symbol: series.symbol().clone(),
            price,
            rsi,
            change_24h,
            change_7d,
            volatility,
            vwap,
            support: levels.support,
            resistance: levels.resistance,
            volume_24h,
        };

        match set.first_non_finite() {
            Some(metric) => Err(IndicatorError::NonFinite { metric }),
            None => Ok(set),
        }
    }
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            rsi: Rsi::default(),
            levels: PriceLevels::new(),
            vwap: Vwap::new(),
        }
    }
}

fn rename_metric(err: IndicatorError, metric: &'static str) -> IndicatorError {
    match err {
        IndicatorError::InsufficientHistory {
            required,
            available,
            ..
        } => IndicatorError::InsufficientHistory {
            metric,
            required,
            available,
        },
        other => other,
    }
}
