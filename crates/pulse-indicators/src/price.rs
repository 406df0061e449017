//! Price-action indicators: percent change, VWAP and support/resistance.

use pulse_core::traits::Indicator;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics};

/// Percent change between each value and the value `bars_back` earlier.
#[derive(Debug, Clone)]
pub struct PercentChange {
    bars_back: usize,
}

impl PercentChange {
    /// Create a percent change over `bars_back` bars.
    pub fn new(bars_back: usize) -> Self {
        assert!(bars_back > 0, "Lookback must be greater than 0");
        Self { bars_back }
    }
}

impl Indicator for PercentChange {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() <= self.bars_back {
            return vec![];
        }

        data.iter()
            .zip(data[self.bars_back..].iter())
            .map(|(&past, &now)| (now - past) / past * 100.0)
            .collect()
    }

    fn period(&self) -> usize {
        self.bars_back + 1
    }

    fn name(&self) -> &'static str {
        "percent_change"
    }
}

/// Volume-Weighted Average Price over a whole window.
#[derive(Debug, Clone, Default)]
pub struct Vwap;

impl Vwap {
    pub fn new() -> Self {
        Self
    }

    /// Weighted mean of `prices` by `volumes`.
    ///
    /// Returns `None` for empty input, mismatched lengths or zero total volume.
    pub fn calculate(&self, prices: &[f64], volumes: &[f64]) -> Option<f64> {
        if prices.is_empty() || prices.len() != volumes.len() {
            return None;
        }

        let (weighted, total) = prices
            .iter()
            .zip(volumes.iter())
            .fold((0.0, 0.0), |(pv, v), (&p, &vol)| (pv + p * vol, v + vol));

        if total == 0.0 {
            None
        } else {
            Some(weighted / total)
        }
    }
}

/// Support and resistance levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelsOutput {
    pub support: f64,
    pub resistance: f64,
}

/// Support/resistance from the closes of a trailing window.
///
/// Uses the minimum and maximum close, or the `p`th and `(100 - p)`th
/// percentile when a percentile is set.
#[derive(Debug, Clone, Default)]
pub struct PriceLevels {
    window: Option<usize>,
    percentile: Option<usize>,
}

impl PriceLevels {
    /// Min/max close over the whole input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to the last `window` closes.
    pub fn with_window(mut self, window: usize) -> Self {
        assert!(window > 0, "Window must be greater than 0");
        self.window = Some(window);
        self
    }

    /// Use percentiles instead of extremes. `percentile` must be below 50.
    pub fn with_percentile(mut self, percentile: usize) -> Self {
        assert!(percentile < 50, "Percentile must be below 50");
        self.percentile = Some(percentile);
        self
    }

    pub fn calculate(&self, closes: &[f64]) -> Option<LevelsOutput> {
        let start = self
            .window
            .map_or(0, |w| closes.len().saturating_sub(w));
        let window = &closes[start..];
        if window.is_empty() {
            return None;
        }

        let levels = match self.percentile {
            Some(p) => {
                let mut data = Data::new(window.to_vec());
                LevelsOutput {
                    support: data.percentile(p),
                    resistance: data.percentile(100 - p),
                }
            }
            None => LevelsOutput {
                support: window.iter().cloned().fold(f64::INFINITY, f64::min),
                resistance: window.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            },
        };

        Some(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_change() {
        let change = PercentChange::new(2);
        let result = change.calculate(&[100.0, 105.0, 110.0, 99.0]);

        assert_eq!(result.len(), 2);
        assert!((result[0] - 10.0).abs() < 1e-10);
        assert!((result[1] - (-5.714285714)).abs() < 1e-6);
    }

    #[test]
    fn test_percent_change_needs_lookback_plus_one() {
        let change = PercentChange::new(3);
        assert!(change.calculate(&[1.0, 2.0, 3.0]).is_empty());
        assert!(change.latest(&[1.0, 2.0, 3.0]).is_err());
        assert!(change.latest(&[1.0, 2.0, 3.0, 4.0]).is_ok());
    }

    #[test]
    fn test_percent_change_sign_follows_trend() {
        let up: Vec<f64> = (0..50).map(|i| 10.0 + i as f64).collect();
        let down: Vec<f64> = up.iter().rev().cloned().collect();
        let change = PercentChange::new(42);

        assert!(change.latest(&up).unwrap() > 0.0);
        assert!(change.latest(&down).unwrap() < 0.0);
    }

    #[test]
    fn test_vwap() {
        let vwap = Vwap::new();
        let value = vwap.calculate(&[10.0, 20.0], &[1.0, 3.0]).unwrap();
        assert!((value - 17.5).abs() < 1e-10);
    }

    #[test]
    fn test_vwap_zero_volume() {
        let vwap = Vwap::new();
        assert!(vwap.calculate(&[10.0, 20.0], &[0.0, 0.0]).is_none());
        assert!(vwap.calculate(&[], &[]).is_none());
        assert!(vwap.calculate(&[1.0], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn test_levels_extremes() {
        let levels = PriceLevels::new().calculate(&[5.0, 3.0, 9.0, 7.0]).unwrap();
        assert_eq!(levels.support, 3.0);
        assert_eq!(levels.resistance, 9.0);
    }

    #[test]
    fn test_levels_trailing_window() {
        let levels = PriceLevels::new()
            .with_window(2)
            .calculate(&[1.0, 20.0, 9.0, 7.0])
            .unwrap();
        assert_eq!(levels.support, 7.0);
        assert_eq!(levels.resistance, 9.0);
    }

    #[test]
    fn test_levels_percentile_inside_extremes() {
        let closes: Vec<f64> = (1..=100).map(|i| i as f64).collect();
        let levels = PriceLevels::new().with_percentile(10).calculate(&closes).unwrap();

        assert!(levels.support > 1.0 && levels.support < 15.0);
        assert!(levels.resistance > 85.0 && levels.resistance < 100.0);
        assert!(levels.support < levels.resistance);
    }

    #[test]
    fn test_levels_empty() {
        assert!(PriceLevels::new().calculate(&[]).is_none());
    }
}
