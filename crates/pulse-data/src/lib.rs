//! Caching and offline data for the market pulse pipeline.

mod cache;
mod csv_source;

pub use cache::{CacheStats, TtlCache};
pub use csv_source::CsvSeriesSource;

use pulse_core::error::DataError;
use pulse_core::types::{PriceSeries, Symbol, Timeframe};
use std::path::Path;

/// Load a price series from a CSV file.
pub async fn load_csv(
    path: impl AsRef<Path>,
    symbol: Symbol,
    timeframe: Timeframe,
) -> Result<PriceSeries, DataError> {
    let source = CsvSeriesSource::new(path)?;
    source.load_series(symbol, timeframe).await
}
