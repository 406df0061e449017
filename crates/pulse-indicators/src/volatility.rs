//! Volatility indicators.

use pulse_core::traits::Indicator;
use statrs::statistics::Statistics;

/// Annualized volatility of log returns.
///
/// Sample standard deviation of `ln(p[i] / p[i-1])` over the whole input,
/// scaled by the square root of the number of bars per year.
#[derive(Debug, Clone)]
pub struct LogReturnVolatility {
    periods_per_year: f64,
}

impl LogReturnVolatility {
    /// Create a volatility indicator for a sampling rate of
    /// `periods_per_year` bars per year.
    pub fn new(periods_per_year: f64) -> Self {
        assert!(
            periods_per_year > 0.0,
            "Periods per year must be positive"
        );
        Self { periods_per_year }
    }

    /// Log returns between consecutive values.
    ///
    /// Non-positive prices yield non-finite returns.
    pub fn log_returns(data: &[f64]) -> Vec<f64> {
        data.windows(2).map(|w| (w[1] / w[0]).ln()).collect()
    }
}

impl Indicator for LogReturnVolatility {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() < self.period() {
            return vec![];
        }

        let returns = Self::log_returns(data);
        let std_dev = returns.iter().std_dev();
        vec![std_dev * self.periods_per_year.sqrt()]
    }

    fn period(&self) -> usize {
        3 // Two returns for a sample standard deviation
    }

    fn name(&self) -> &'static str {
        "volatility"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_growth_has_zero_volatility() {
        let vol = LogReturnVolatility::new(365.0);
        let data: Vec<f64> = (0..20).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let result = vol.calculate(&data);

        assert_eq!(result.len(), 1);
        assert!(result[0].abs() < 1e-9);
    }

    #[test]
    fn test_alternating_returns() {
        // Returns alternate between +ln(1.1) and -ln(1.1).
        let vol = LogReturnVolatility::new(1.0);
        let data = vec![100.0, 110.0, 100.0, 110.0, 100.0];
        let result = vol.calculate(&data);

        let r = 1.1f64.ln();
        // mean 0, sample variance = 4 r^2 / 3
        let expected = (4.0 * r * r / 3.0).sqrt();
        assert!((result[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_annualization_scales_by_sqrt() {
        let data = vec![100.0, 102.0, 99.0, 101.0, 103.0];
        let daily = LogReturnVolatility::new(1.0).calculate(&data)[0];
        let annual = LogReturnVolatility::new(365.0).calculate(&data)[0];

        assert!((annual - daily * 365f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_too_short() {
        let vol = LogReturnVolatility::new(365.0);
        assert!(vol.calculate(&[1.0, 2.0]).is_empty());
        assert!(vol.validate_data(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_non_positive_price_is_not_finite() {
        let vol = LogReturnVolatility::new(365.0);
        let result = vol.calculate(&[1.0, 0.0, 1.0]);
        assert!(!result[0].is_finite());
    }
}
