//! Offline OHLCV series from CSV exports.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use pulse_core::error::DataError;
use pulse_core::types::{Bar, PriceSeries, Symbol, Timeframe};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// CSV record format.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(
        alias = "Date",
        alias = "date",
        alias = "timestamp",
        alias = "Timestamp",
        alias = "open_time"
    )]
    date: String,
    #[serde(alias = "Open", alias = "open")]
    open: f64,
    #[serde(alias = "High", alias = "high")]
    high: f64,
    #[serde(alias = "Low", alias = "low")]
    low: f64,
    #[serde(alias = "Close", alias = "close")]
    close: f64,
    #[serde(alias = "Volume", alias = "volume", default)]
    volume: f64,
}

/// CSV file holding one symbol's bars.
pub struct CsvSeriesSource {
    path: PathBuf,
}

impl CsvSeriesSource {
    /// Create a new CSV source.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::NoDataAvailable);
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the file as a validated series.
    pub async fn load_series(
        &self,
        symbol: Symbol,
        timeframe: Timeframe,
    ) -> Result<PriceSeries, DataError> {
        let contents = tokio::fs::read(&self.path)
            .await
            .map_err(|e| DataError::ParseError(format!("{}: {e}", self.path.display())))?;
        let bars = read_bars(contents.as_slice())?;
        debug!(path = %self.path.display(), bars = bars.len(), "loaded CSV bars");
        PriceSeries::new(symbol, timeframe, bars)
    }
}

/// Read bars from CSV, sorted by timestamp.
pub(crate) fn read_bars<R: Read>(reader: R) -> Result<Vec<Bar>, DataError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut bars = Vec::new();

    for result in reader.deserialize() {
        let record: CsvRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;

        let timestamp = parse_timestamp(&record.date)?;

        bars.push(Bar::new(
            timestamp,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        ));
    }

    bars.sort_by_key(|b| b.timestamp);

    Ok(bars)
}

/// Parse a timestamp as RFC 3339, a calendar date/time, or Unix seconds/millis.
fn parse_timestamp(date_str: &str) -> Result<i64, DataError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Ok(dt.timestamp_millis());
    }

    let datetime_formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];
    for format in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }

    let date_formats = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];
    for format in date_formats {
        if let Ok(d) = NaiveDate::parse_from_str(date_str, format) {
            if let Some(dt) = d.and_hms_opt(0, 0, 0) {
                return Ok(dt.and_utc().timestamp_millis());
            }
        }
    }

    if let Ok(ts) = date_str.parse::<i64>() {
        // Assume milliseconds if > 10 digits
        return Ok(if ts > 10_000_000_000 { ts } else { ts * 1000 });
    }

    Err(DataError::ParseError(format!(
        "Could not parse date: {}",
        date_str
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("2024-01-15").unwrap(), 1_705_276_800_000);
        assert_eq!(
            parse_timestamp("2024-01-15 04:00:00").unwrap(),
            1_705_276_800_000 + 4 * 3_600_000
        );
        assert_eq!(
            parse_timestamp("2024-01-15T04:00:00Z").unwrap(),
            1_705_276_800_000 + 4 * 3_600_000
        );
        assert_eq!(parse_timestamp("1705312800000").unwrap(), 1_705_312_800_000);
        assert_eq!(parse_timestamp("1705312800").unwrap(), 1_705_312_800_000);
        assert!(parse_timestamp("last tuesday").is_err());
    }

    #[test]
    fn test_read_bars_sorts_and_accepts_aliases() {
        let csv = "\
Timestamp,Open,High,Low,Close,Volume
2024-01-15 08:00:00,101,103,100,102,20
2024-01-15 04:00:00,100,102,99,101,10
";
        let bars = read_bars(csv.as_bytes()).unwrap();
        assert_eq!(bars.len(), 2);
        assert!(bars[0].timestamp < bars[1].timestamp);
        assert_eq!(bars[0].close, 101.0);
        assert_eq!(bars[1].volume, 20.0);
    }

    #[test]
    fn test_read_bars_rejects_bad_rows() {
        let csv = "date,open,high,low,close,volume\n2024-01-15,abc,1,1,1,1\n";
        assert!(matches!(
            read_bars(csv.as_bytes()),
            Err(DataError::ParseError(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_file() {
        assert!(matches!(
            CsvSeriesSource::new("/definitely/not/here.csv"),
            Err(DataError::NoDataAvailable)
        ));
    }

    #[tokio::test]
    async fn test_load_series_validates_interval() {
        let dir = std::env::temp_dir().join(format!("pulse-csv-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("gappy.csv");
        std::fs::write(
            &path,
            "date,open,high,low,close,volume\n\
             2024-01-15 00:00:00,1,1,1,1,1\n\
             2024-01-15 04:00:00,1,1,1,1,1\n\
             2024-01-15 12:00:00,1,1,1,1,1\n",
        )
        .unwrap();

        let source = CsvSeriesSource::new(&path).unwrap();
        let err = source
            .load_series(Symbol::new("BTC", "USDT"), Timeframe::Hour4)
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::IrregularInterval { index: 2, .. }));

        let series = source
            .load_series(Symbol::new("BTC", "USDT"), Timeframe::Hour1)
            .await;
        assert!(series.is_err());

        std::fs::remove_dir_all(&dir).ok();
    }
}
