/// End-to-end flow without network or database:
/// listing -> universe -> publish tick -> broadcast topic -> consumer -> store -> analytics.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;

use tickerflow::external::price_provider::{ListingProvider, ProviderError, Quote, QuoteProvider};
use tickerflow::models::{AnalysisStatus, Signal, Timeframe};
use tickerflow::services::analytics_service::AnalyticsEngine;
use tickerflow::services::consumer_service;
use tickerflow::services::price_cache::PriceCache;
use tickerflow::services::publish_scheduler::PublishScheduler;
use tickerflow::services::publisher::BroadcastPublisher;
use tickerflow::services::symbol_universe::SymbolUniverse;
use tickerflow::store::{HistoricalStore, MemoryHistoricalStore};

struct ScriptedQuotes {
    prices: Mutex<Vec<(String, f64)>>,
}

impl ScriptedQuotes {
    fn set(&self, symbol: &str, price: f64) {
        let mut prices = self.prices.lock();
        prices.retain(|(s, _)| s != symbol);
        prices.push((symbol.to_string(), price));
    }
}

#[async_trait]
impl QuoteProvider for ScriptedQuotes {
    async fn fetch_quote(&self, symbol: &str) -> Result<Quote, ProviderError> {
        self.prices
            .lock()
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, p)| Quote {
                previous_close: Some(100.0),
                ..Quote::new(*p, 1_000.0)
            })
            .ok_or(ProviderError::NotFound)
    }
}

struct Listing;

#[async_trait]
impl ListingProvider for Listing {
    async fn fetch_symbols(&self) -> Result<Vec<String>, ProviderError> {
        Ok(vec!["AAA".into(), "BBB".into(), "CCC".into(), "bad symbol".into()])
    }
}

#[tokio::test]
async fn test_ticks_flow_into_store_and_analytics() {
    let quotes = Arc::new(ScriptedQuotes {
        prices: Mutex::new(Vec::new()),
    });
    quotes.set("AAA", 100.0);
    quotes.set("BBB", 50.0);
    quotes.set("CCC", 10.0);

    let store = Arc::new(MemoryHistoricalStore::new());
    // zero rate limit so every tick refetches
    let cache = PriceCache::new(quotes.clone(), Duration::ZERO, Duration::from_secs(1));
    let universe = Arc::new(SymbolUniverse::new(Arc::new(Listing), Duration::from_secs(1)));

    let publisher = BroadcastPublisher::new("stock-prices", 64);
    let consumer = consumer_service::spawn(publisher.subscribe(), store.clone());
    let scheduler = PublishScheduler::new(
        universe.clone(),
        cache.clone(),
        Arc::new(publisher),
        Duration::from_secs(10),
        2,
    );

    // first tick only loads the universe
    let first = scheduler.tick().await;
    assert!(first.selected.is_empty());
    assert_eq!(universe.len(), 3);

    let base = Utc::now().timestamp_millis() / 10_000 * 10_000 - 60_000;
    let mut published = 0;
    for (i, aaa_price) in [100.0, 101.0, 103.0].into_iter().enumerate() {
        quotes.set("AAA", aaa_price);
        let now = Utc.timestamp_millis_opt(base + i as i64 * 10_000).unwrap();
        let report = scheduler.tick_at(now).await;
        assert_eq!(report.selected.len(), 2);
        published += report.published;
    }
    assert_eq!(published, 6);

    drop(scheduler);
    let stored = consumer.await.unwrap();
    assert_eq!(stored, 6);
    assert_eq!(store.len(), 6);

    // every symbol was covered by the rotation
    for symbol in ["AAA", "BBB", "CCC"] {
        let recent = store.query_recent(symbol, 10).await.unwrap();
        assert!(!recent.is_empty(), "{} was never published", symbol);
    }

    quotes.set("AAA", 110.0);
    let engine = AnalyticsEngine::new(store.clone(), cache);
    let trend = engine.analyze_trend("AAA", Timeframe::OneDay).await;
    assert_eq!(trend.trend, Signal::Bullish);
    assert_eq!(trend.status, AnalysisStatus::Computed);
}
