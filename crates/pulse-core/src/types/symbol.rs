//! Trading pair identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DataError;

/// A spot trading pair such as `BTC/USDT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol {
    /// Base asset (the thing being priced)
    pub base: String,
    /// Quote asset (the settlement currency)
    pub quote: String,
}

impl Symbol {
    /// Create a new symbol. Assets are upper-cased.
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into().to_uppercase(),
            quote: quote.into().to_uppercase(),
        }
    }

    /// Concatenated form used by exchange REST APIs (`BTCUSDT`).
    pub fn exchange_id(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }

    /// Check whether this pair settles in `quote`.
    pub fn is_quoted_in(&self, quote: &str) -> bool {
        self.quote.eq_ignore_ascii_case(quote)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl FromStr for Symbol {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((base, quote)) if !base.trim().is_empty() && !quote.trim().is_empty() => {
                Ok(Symbol::new(base.trim(), quote.trim()))
            }
            _ => Err(DataError::InvalidSymbol(s.to_string())),
        }
    }
}

impl TryFrom<String> for Symbol {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.to_string()
    }
}
