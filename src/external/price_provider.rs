use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Latest market data for one symbol as reported by a quote source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub price: f64,
    pub volume: f64,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub previous_close: Option<f64>,
}

impl Quote {
    pub fn new(price: f64, volume: f64) -> Self {
        Self {
            price,
            volume,
            open: None,
            high: None,
            low: None,
            previous_close: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,

    #[error("symbol not found")]
    NotFound,

    #[error("request timed out")]
    Timeout,
}

/// Source of live quotes. Treated as unreliable: callers bound every call with a timeout.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, ProviderError>;
}

/// Source of the tradable symbol list.
#[async_trait]
pub trait ListingProvider: Send + Sync {
    async fn fetch_symbols(&self) -> Result<Vec<String>, ProviderError>;
}
