//! Error types for the market pulse pipeline.

use std::time::Duration;
use thiserror::Error;

/// Top-level pipeline error.
#[derive(Error, Debug)]
pub enum PulseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Indicator error: {0}")]
    Indicator(#[from] IndicatorError),

    #[error("Aggregation failed: {0}")]
    Aggregation(#[from] AggregationFailure),
}

/// A single upstream request failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited by exchange")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),
}

impl ExchangeError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ExchangeError::Network(_)
            | ExchangeError::RateLimited { .. }
            | ExchangeError::Malformed(_) => true,
            ExchangeError::Api { status, .. } => *status >= 500,
            ExchangeError::SymbolNotFound(_) => false,
        }
    }

    /// Minimum wait the exchange asked for before the next request.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ExchangeError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Upstream fetch failure after the retry budget was spent.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("fetch for {symbol} failed after {attempts} attempt(s): {source}")]
pub struct FetchError {
    /// Symbol (or request target) the fetch was for
    pub symbol: String,
    /// Number of attempts made
    pub attempts: u32,
    /// Last underlying cause
    #[source]
    pub source: ExchangeError,
}

impl FetchError {
    pub fn new(symbol: impl Into<String>, attempts: u32, source: ExchangeError) -> Self {
        Self {
            symbol: symbol.into(),
            attempts,
            source,
        }
    }
}

/// Price series and offline data errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("No data available")]
    NoDataAvailable,

    #[error("Timestamps not strictly increasing at bar {index}")]
    NonMonotonicTimestamps { index: usize },

    #[error("Irregular sampling at bar {index}: expected {expected_ms}ms step, got {actual_ms}ms")]
    IrregularInterval {
        index: usize,
        expected_ms: i64,
        actual_ms: i64,
    },

    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Indicator calculation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("Insufficient history for {metric}: need {required} bars, have {available}")]
    InsufficientHistory {
        metric: &'static str,
        required: usize,
        available: usize,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Non-finite value for {metric}")]
    NonFinite { metric: &'static str },
}

/// Why a single symbol was left out of a cycle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SymbolError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("indicator computation for {symbol} failed: {source}")]
    Indicator {
        symbol: String,
        #[source]
        source: IndicatorError,
    },

    #[error("worker for {symbol} aborted: {reason}")]
    Aborted { symbol: String, reason: String },
}

/// A cycle that produced nothing publishable.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregationFailure {
    #[error("symbol universe is empty")]
    EmptyUniverse,

    #[error(
        "no usable symbols out of {attempted} ({fetch_failures} fetch failures, {indicator_failures} indicator failures, {aborted} aborted)"
    )]
    NoUsableSymbols {
        attempted: usize,
        fetch_failures: usize,
        indicator_failures: usize,
        aborted: usize,
    },
}
