//! Type definitions shared by the gateway traits and REST clients.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A trading pair: base asset quoted in a fiat currency (e.g. "BTC/USD").
///
/// Every pair tracked by the engine resolves to exactly one base asset
/// string, which is the key used for balance and price lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub base: String,
    pub quote: String,
}

impl Symbol {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }

    /// Pair notation used on the wire, e.g. "BTC/USD".
    pub fn pair(&self) -> String {
        format!("{}/{}", self.base, self.quote)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Error raised when a pair string is not of the form "BASE/QUOTE".
#[derive(Debug, thiserror::Error)]
#[error("invalid trading pair {0:?}, expected BASE/QUOTE")]
pub struct ParseSymbolError(pub String);

impl FromStr for Symbol {
    type Err = ParseSymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((base, quote)) if !base.is_empty() && !quote.is_empty() => {
                Ok(Symbol::new(base, quote))
            }
            _ => Err(ParseSymbolError(s.to_string())),
        }
    }
}

/// A single timestamp-ordered price observation for a base asset.
#[derive(Debug, Clone)]
pub struct PriceSample {
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// A sized, precision-adjusted order ready for submission.
///
/// Derived fresh each cycle and consumed immediately; never stored.
#[derive(Debug, Clone)]
pub struct OrderIntent {
    pub symbol: Symbol,
    pub side: OrderSide,
    /// Quantity in base-asset units, always non-negative.
    pub quantity: Decimal,
    /// Absolute notional the order is meant to move, for logging.
    pub notional_usd: Decimal,
}

/// Acknowledgement returned by the venue for a placed order.
///
/// The engine only cares about success/failure; the rest is informational.
#[derive(Debug, Clone, Default)]
pub struct OrderAck {
    pub order_id: Option<i64>,
    pub status: String,
}

/// Exchange metadata document with per-pair trading constraints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExchangeInfo {
    #[serde(rename = "TradePairs", default)]
    pub trade_pairs: HashMap<String, TradePairInfo>,
}

/// Per-pair constraints as reported by the venue.
#[derive(Debug, Clone, Deserialize)]
pub struct TradePairInfo {
    #[serde(rename = "AmountPrecision", default)]
    pub amount_precision: u32,
}

/// Errors reported by a trading venue, as opposed to transport failures.
#[derive(Debug, thiserror::Error)]
pub enum VenueError {
    #[error("venue credentials are not configured")]
    MissingCredentials,
    #[error("order rejected by venue: {0}")]
    OrderRejected(String),
    #[error("venue replied with an error: {0}")]
    Api(String),
}
