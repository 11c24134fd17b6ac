use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::external::price_provider::Quote;

/// A point-in-time quote for one symbol, as emitted on the publish topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    pub symbol: String,
    pub price: f64,
    pub volume: f64,
    pub change: f64,
    pub change_percent: f64,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub previous_close: f64,
    pub timestamp: DateTime<Utc>,
}

impl PriceSnapshot {
    /// Fields the upstream did not report fall back to the quoted price.
    pub fn from_quote(symbol: &str, quote: &Quote, timestamp: DateTime<Utc>) -> Self {
        let price = quote.price;
        let previous_close = quote.previous_close.unwrap_or(price);
        let change = price - previous_close;
        let change_percent = if previous_close != 0.0 {
            change / previous_close * 100.0
        } else {
            0.0
        };

        Self {
            symbol: symbol.to_string(),
            price,
            volume: quote.volume,
            change,
            change_percent,
            high: quote.high.unwrap_or(price),
            low: quote.low.unwrap_or(price),
            open: quote.open.unwrap_or(price),
            previous_close,
            timestamp,
        }
    }
}
