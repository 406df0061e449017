//! Binance spot public market-data integration.

use async_trait::async_trait;
use pulse_core::error::ExchangeError;
use pulse_core::traits::MarketDataSource;
use pulse_core::types::{Bar, MarketInfo, Symbol, Timeframe};
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

/// Largest `limit` the klines endpoint accepts.
pub const MAX_KLINES: usize = 1000;

// Request weights, charged against the per-minute weight budget.
const EXCHANGE_INFO_WEIGHT: u32 = 20;
const TICKER_24H_ALL_WEIGHT: u32 = 80;
const KLINES_WEIGHT: u32 = 2;

/// Binance API configuration.
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    pub base_url: String,
    pub request_timeout: Duration,
}

impl BinanceConfig {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout,
        }
    }
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self::new("https://api.binance.com", Duration::from_secs(10))
    }
}

/// Binance API response types
#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolInfo {
    symbol: String,
    status: String,
    base_asset: String,
    quote_asset: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24h {
    symbol: String,
    last_price: String,
    quote_volume: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[allow(dead_code)]
    code: i64,
    msg: String,
}

/// Binance public REST source.
pub struct BinanceSource {
    config: BinanceConfig,
    client: Client,
}

impl BinanceSource {
    /// Create a new Binance source.
    pub fn new(config: BinanceConfig) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ExchangeError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ExchangeError> {
        let url = format!("{}{}", self.config.base_url, path);

        let resp = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| ExchangeError::Network(e.to_string()))?;

        if let Some(weight) = resp
            .headers()
            .get("X-MBX-USED-WEIGHT-1M")
            .and_then(|v| v.to_str().ok())
        {
            debug!(path, weight, "Binance request weight used");
        }

        let status = resp.status();
        if !status.is_success() {
            let retry_after = resp
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, retry_after, &text));
        }

        resp.json::<T>()
            .await
            .map_err(|e| ExchangeError::Malformed(e.to_string()))
    }
}

/// Map a non-success HTTP response onto an [`ExchangeError`].
fn classify_status(status: StatusCode, retry_after: Option<Duration>, body: &str) -> ExchangeError {
    // 418 is Binance's escalation of repeated 429s (IP ban).
    if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() == 418 {
        return ExchangeError::RateLimited { retry_after };
    }

    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.msg)
        .unwrap_or_else(|_| body.to_string());

    if status == StatusCode::BAD_REQUEST && message.contains("Invalid symbol") {
        return ExchangeError::SymbolNotFound(message);
    }

    ExchangeError::Api {
        status: status.as_u16(),
        message,
    }
}

/// Join exchange metadata with 24h tickers for markets quoted in `quote`.
///
/// Markets without a ticker are reported with zero volume.
fn markets_from(info: ExchangeInfo, tickers: Vec<Ticker24h>, quote: &str) -> Vec<MarketInfo> {
    let tickers: HashMap<String, Ticker24h> =
        tickers.into_iter().map(|t| (t.symbol.clone(), t)).collect();

    info.symbols
        .into_iter()
        .filter(|s| s.quote_asset.eq_ignore_ascii_case(quote))
        .map(|s| {
            let (quote_volume, last_price) = tickers
                .get(&s.symbol)
                .map(|t| {
                    (
                        t.quote_volume.parse().unwrap_or(0.0),
                        t.last_price.parse().unwrap_or(0.0),
                    )
                })
                .unwrap_or((0.0, 0.0));
            MarketInfo::new(
                Symbol::new(s.base_asset, s.quote_asset),
                s.status == "TRADING",
                quote_volume,
                last_price,
            )
        })
        .collect()
}

/// Parse one kline row: `[openTime, open, high, low, close, volume, ...]`,
/// where prices and volume are decimal strings.
fn parse_kline(row: &[serde_json::Value]) -> Result<Bar, ExchangeError> {
    let timestamp = row
        .first()
        .and_then(|v| v.as_i64())
        .ok_or_else(|| ExchangeError::Malformed("kline open time missing".into()))?;

    let field = |idx: usize| -> Result<f64, ExchangeError> {
        let value = row
            .get(idx)
            .ok_or_else(|| ExchangeError::Malformed(format!("kline field {idx} missing")))?;
        match value {
            serde_json::Value::String(s) => s
                .parse::<f64>()
                .map_err(|e| ExchangeError::Malformed(format!("kline field {idx}: {e}"))),
            serde_json::Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| ExchangeError::Malformed(format!("kline field {idx} not a float"))),
            other => Err(ExchangeError::Malformed(format!(
                "kline field {idx} has unexpected type: {other}"
            ))),
        }
    };

    Ok(Bar::new(
        timestamp,
        field(1)?,
        field(2)?,
        field(3)?,
        field(4)?,
        field(5)?,
    ))
}

#[async_trait]
impl MarketDataSource for BinanceSource {
    #[instrument(skip(self), name = "binance::list_markets")]
    async fn list_markets(&self, quote: &str) -> Result<Vec<MarketInfo>, ExchangeError> {
        let info: ExchangeInfo = self.get_json("/api/v3/exchangeInfo", &[]).await?;
        let tickers: Vec<Ticker24h> = self.get_json("/api/v3/ticker/24hr", &[]).await?;

        let markets = markets_from(info, tickers, quote);
        debug!(count = markets.len(), "listed Binance markets");
        Ok(markets)
    }

    #[instrument(skip(self), fields(symbol = %symbol), name = "binance::fetch_ohlcv")]
    async fn fetch_ohlcv(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Bar>, ExchangeError> {
        let params = [
            ("symbol", symbol.exchange_id()),
            ("interval", timeframe.to_string()),
            ("limit", limit.clamp(1, MAX_KLINES).to_string()),
        ];
        let rows: Vec<Vec<serde_json::Value>> = self.get_json("/api/v3/klines", &params).await?;

        rows.iter().map(|row| parse_kline(row)).collect()
    }

    /// `exchangeInfo` plus the all-symbol `ticker/24hr`.
    fn list_markets_cost(&self) -> u32 {
        EXCHANGE_INFO_WEIGHT + TICKER_24H_ALL_WEIGHT
    }

    fn fetch_ohlcv_cost(&self) -> u32 {
        KLINES_WEIGHT
    }

    fn name(&self) -> &str {
        "Binance"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_weights() {
        let source = BinanceSource::new(BinanceConfig::default()).unwrap();
        assert_eq!(source.list_markets_cost(), 100);
        assert_eq!(source.fetch_ohlcv_cost(), 2);
    }

    #[test]
    fn test_parse_kline() {
        let row = json!([
            1_700_000_000_000i64,
            "37000.10",
            "37250.00",
            "36900.00",
            "37100.55",
            "1234.5",
            1_700_014_399_999i64,
            "45800000.0",
            1500,
            "600.0",
            "22000000.0",
            "0"
        ]);
        let bar = parse_kline(row.as_array().unwrap()).unwrap();

        assert_eq!(bar.timestamp, 1_700_000_000_000);
        assert!((bar.open - 37000.10).abs() < 1e-9);
        assert!((bar.close - 37100.55).abs() < 1e-9);
        assert!((bar.volume - 1234.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_kline_rejects_garbage() {
        let short = json!([1_700_000_000_000i64, "1.0", "2.0"]);
        assert!(matches!(
            parse_kline(short.as_array().unwrap()),
            Err(ExchangeError::Malformed(_))
        ));

        let bad_number = json!([1_700_000_000_000i64, "abc", "2", "1", "1.5", "10"]);
        assert!(parse_kline(bad_number.as_array().unwrap()).is_err());

        let bad_time = json!(["yesterday", "1", "2", "1", "1.5", "10"]);
        assert!(parse_kline(bad_time.as_array().unwrap()).is_err());
    }

    #[test]
    fn test_markets_from_joins_tickers() {
        let info: ExchangeInfo = serde_json::from_value(json!({
            "symbols": [
                {"symbol": "BTCUSDT", "status": "TRADING", "baseAsset": "BTC", "quoteAsset": "USDT"},
                {"symbol": "LUNAUSDT", "status": "BREAK", "baseAsset": "LUNA", "quoteAsset": "USDT"},
                {"symbol": "ETHBTC", "status": "TRADING", "baseAsset": "ETH", "quoteAsset": "BTC"},
                {"symbol": "NEWUSDT", "status": "TRADING", "baseAsset": "NEW", "quoteAsset": "USDT"}
            ]
        }))
        .unwrap();
        let tickers: Vec<Ticker24h> = serde_json::from_value(json!([
            {"symbol": "BTCUSDT", "lastPrice": "67000.5", "quoteVolume": "1900000000.0"},
            {"symbol": "LUNAUSDT", "lastPrice": "0.5", "quoteVolume": "3000000.0"},
            {"symbol": "ETHBTC", "lastPrice": "0.05", "quoteVolume": "900.0"}
        ]))
        .unwrap();

        let markets = markets_from(info, tickers, "USDT");
        assert_eq!(markets.len(), 3);

        let btc = &markets[0];
        assert_eq!(btc.symbol, Symbol::new("BTC", "USDT"));
        assert!(btc.active);
        assert!((btc.quote_volume - 1.9e9).abs() < 1.0);

        assert!(!markets[1].active);
        assert_eq!(markets[2].quote_volume, 0.0);
    }

    #[test]
    fn test_classify_status() {
        let limited = classify_status(
            StatusCode::TOO_MANY_REQUESTS,
            Some(Duration::from_secs(7)),
            "",
        );
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(7)));

        let banned = classify_status(StatusCode::from_u16(418).unwrap(), None, "");
        assert!(matches!(banned, ExchangeError::RateLimited { .. }));

        let unknown = classify_status(
            StatusCode::BAD_REQUEST,
            None,
            r#"{"code":-1121,"msg":"Invalid symbol."}"#,
        );
        assert!(matches!(unknown, ExchangeError::SymbolNotFound(_)));
        assert!(!unknown.is_transient());

        let outage = classify_status(StatusCode::BAD_GATEWAY, None, "upstream down");
        assert_eq!(
            outage,
            ExchangeError::Api {
                status: 502,
                message: "upstream down".into()
            }
        );
        assert!(outage.is_transient());
    }
}
