use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::external::price_provider::{ProviderError, Quote, QuoteProvider};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance chart endpoint. No API key required; the quote lives in the `meta` block.
pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (compatible; tickerflow/0.1)")
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

// Minimal response structs (only what we need)
#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooResult {
    meta: YahooMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooMeta {
    regular_market_price: Option<f64>,
    regular_market_volume: Option<f64>,
    regular_market_open: Option<f64>,
    regular_market_day_high: Option<f64>,
    regular_market_day_low: Option<f64>,
    previous_close: Option<f64>,
    chart_previous_close: Option<f64>,
}

/// Extracts a [`Quote`] from a chart response body.
pub fn parse_chart_quote(body: &str) -> Result<Quote, ProviderError> {
    let response: YahooChartResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    if let Some(err) = response.chart.error {
        if err.code.as_deref() == Some("Not Found") {
            return Err(ProviderError::NotFound);
        }
        return Err(ProviderError::BadResponse(
            err.description
                .or(err.code)
                .unwrap_or_else(|| "unknown chart error".to_string()),
        ));
    }

    let meta = response
        .chart
        .result
        .and_then(|mut r| r.pop())
        .map(|r| r.meta)
        .ok_or_else(|| ProviderError::BadResponse("missing result".into()))?;

    let price = meta
        .regular_market_price
        .ok_or_else(|| ProviderError::BadResponse("missing regularMarketPrice".into()))?;

    Ok(Quote {
        price,
        volume: meta.regular_market_volume.unwrap_or(0.0),
        open: meta.regular_market_open,
        high: meta.regular_market_day_high,
        low: meta.regular_market_day_low,
        previous_close: meta.previous_close.or(meta.chart_previous_close),
    })
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, ProviderError> {
        let url = format!("{}/{}", self.base_url, symbol);

        let resp = self
            .client
            .get(url)
            .query(&[("interval", "1d"), ("range", "1d")])
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

        parse_chart_quote(&body)
    }
}
