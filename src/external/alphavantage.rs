use std::time::Duration;

use async_trait::async_trait;
use csv::ReaderBuilder;
use serde::Deserialize;

use crate::external::price_provider::{ListingProvider, ProviderError};

const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage `LISTING_STATUS` endpoint, used as the symbol universe source.
pub struct AlphaVantageListingProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AlphaVantageListingProvider {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, timeout)
    }

    pub fn with_base_url(
        api_key: String,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ListingRow {
    symbol: String,
    #[serde(default)]
    status: Option<String>,
}

// When throttled or misconfigured Alpha Vantage answers with JSON instead of CSV:
// { "Note": "Thank you for using Alpha Vantage! ..." } or { "Information": "..." }
#[derive(Debug, Deserialize)]
struct AvNotice {
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

/// Parses a `LISTING_STATUS` CSV body into symbols, in listing order.
pub fn parse_listing_csv(body: &str) -> Result<Vec<String>, ProviderError> {
    let trimmed = body.trim_start();
    if trimmed.starts_with('{') {
        let notice: AvNotice =
            serde_json::from_str(trimmed).map_err(|e| ProviderError::Parse(e.to_string()))?;
        if let Some(msg) = notice.error_message {
            return Err(ProviderError::BadResponse(msg));
        }
        if notice.note.is_some() || notice.information.is_some() {
            return Err(ProviderError::RateLimited);
        }
        return Err(ProviderError::BadResponse("unexpected JSON body".into()));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(trimmed.as_bytes());

    let mut symbols = Vec::new();
    for row in reader.deserialize::<ListingRow>() {
        let row = row.map_err(|e| ProviderError::Parse(e.to_string()))?;
        let active = row
            .status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("active"))
            .unwrap_or(true);
        if active {
            symbols.push(row.symbol);
        }
    }

    Ok(symbols)
}

#[async_trait]
impl ListingProvider for AlphaVantageListingProvider {
    async fn fetch_symbols(&self) -> Result<Vec<String>, ProviderError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", "LISTING_STATUS"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }

        let body = resp
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        parse_listing_csv(&body)
    }
}
