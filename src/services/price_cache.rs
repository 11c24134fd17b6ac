use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration, Instant};
use tracing::{debug, warn};

use crate::external::price_provider::{ProviderError, Quote, QuoteProvider};

/// Minimum time between two upstream fetches for the same symbol.
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_secs(5);

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// Fetched from upstream on this call.
    Live(T),
    /// Served from cache because the symbol was fetched within the rate-limit window.
    Cached(T),
    /// Upstream failed; this is the last value we knew.
    Stale(T),
    /// Upstream failed and nothing was ever cached.
    Missing,
}

impl<T> Lookup<T> {
    pub fn into_value(self) -> Option<T> {
        match self {
            Lookup::Live(v) | Lookup::Cached(v) | Lookup::Stale(v) => Some(v),
            Lookup::Missing => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Lookup<U> {
        match self {
            Lookup::Live(v) => Lookup::Live(f(v)),
            Lookup::Cached(v) => Lookup::Cached(f(v)),
            Lookup::Stale(v) => Lookup::Stale(f(v)),
            Lookup::Missing => Lookup::Missing,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Lookup::Live(_))
    }
}

/// Last known quote for a symbol. Replaced as a whole, never mutated in place.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub symbol: String,
    pub last_quote: Quote,
    pub last_fetch_at: Instant,
}

impl CacheEntry {
    pub fn last_price(&self) -> f64 {
        self.last_quote.price
    }
}

#[derive(Debug, Clone)]
struct VolumeEntry {
    last_volume: f64,
    last_fetch_at: Instant,
}

/// Rate-limited gateway to the upstream quote source.
///
/// Each symbol has its own clock: inside the window the cached value is returned without
/// contacting upstream, and on upstream failure the last known value is served instead.
/// Map guards are never held across the upstream call. Concurrent lookups of one symbol
/// queue on a per-symbol fetch lock, so only one of them goes upstream per window.
#[derive(Clone)]
pub struct PriceCache {
    provider: Arc<dyn QuoteProvider>,
    quotes: Arc<DashMap<String, CacheEntry>>,
    volumes: Arc<DashMap<String, VolumeEntry>>,
    quote_fetches: Arc<DashMap<String, Arc<Mutex<()>>>>,
    volume_fetches: Arc<DashMap<String, Arc<Mutex<()>>>>,
    rate_limit: Duration,
    upstream_timeout: Duration,
}

impl PriceCache {
    pub fn new(
        provider: Arc<dyn QuoteProvider>,
        rate_limit: Duration,
        upstream_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            quotes: Arc::new(DashMap::new()),
            volumes: Arc::new(DashMap::new()),
            quote_fetches: Arc::new(DashMap::new()),
            volume_fetches: Arc::new(DashMap::new()),
            rate_limit,
            upstream_timeout,
        }
    }

    /// Current price, or the last known one, or 0.0 if the symbol was never fetched.
    pub async fn get_price(&self, symbol: &str) -> f64 {
        self.lookup_price(symbol).await.into_value().unwrap_or(0.0)
    }

    pub async fn lookup_price(&self, symbol: &str) -> Lookup<f64> {
        self.lookup_quote(symbol).await.map(|q| q.price)
    }

    pub async fn lookup_quote(&self, symbol: &str) -> Lookup<Quote> {
        if let Some(quote) = self.fresh_quote(symbol) {
            debug!("Serving cached quote for {}", symbol);
            return Lookup::Cached(quote);
        }

        let lock = fetch_lock(&self.quote_fetches, symbol);
        let _fetching = lock.lock().await;
        // another caller may have refreshed the entry while we waited
        if let Some(quote) = self.fresh_quote(symbol) {
            return Lookup::Cached(quote);
        }

        match self.fetch(symbol).await {
            Ok(quote) => {
                self.quotes.insert(
                    symbol.to_string(),
                    CacheEntry {
                        symbol: symbol.to_string(),
                        last_quote: quote.clone(),
                        last_fetch_at: Instant::now(),
                    },
                );
                Lookup::Live(quote)
            }
            Err(e) => {
                warn!("Error fetching price for {}: {}", symbol, e);
                match self.quotes.get(symbol).map(|entry| entry.last_quote.clone()) {
                    Some(quote) => Lookup::Stale(quote),
                    None => Lookup::Missing,
                }
            }
        }
    }

    /// Current traded volume, rate-limited on its own per-symbol clock.
    pub async fn lookup_volume(&self, symbol: &str) -> Lookup<f64> {
        if let Some(volume) = self.fresh_volume(symbol) {
            return Lookup::Cached(volume);
        }

        let lock = fetch_lock(&self.volume_fetches, symbol);
        let _fetching = lock.lock().await;
        if let Some(volume) = self.fresh_volume(symbol) {
            return Lookup::Cached(volume);
        }

        match self.fetch(symbol).await {
            Ok(quote) => {
                self.volumes.insert(
                    symbol.to_string(),
                    VolumeEntry {
                        last_volume: quote.volume,
                        last_fetch_at: Instant::now(),
                    },
                );
                Lookup::Live(quote.volume)
            }
            Err(e) => {
                warn!("Error fetching volume for {}: {}", symbol, e);
                match self.volumes.get(symbol).map(|entry| entry.last_volume) {
                    Some(volume) => Lookup::Stale(volume),
                    None => Lookup::Missing,
                }
            }
        }
    }

    /// Copy of every cached price.
    pub fn last_prices(&self) -> HashMap<String, f64> {
        self.quotes
            .iter()
            .map(|entry| (entry.key().clone(), entry.last_price()))
            .collect()
    }

    pub fn entry(&self, symbol: &str) -> Option<CacheEntry> {
        self.quotes.get(symbol).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    fn fresh_quote(&self, symbol: &str) -> Option<Quote> {
        self.quotes
            .get(symbol)
            .filter(|entry| entry.last_fetch_at.elapsed() < self.rate_limit)
            .map(|entry| entry.last_quote.clone())
    }

    fn fresh_volume(&self, symbol: &str) -> Option<f64> {
        self.volumes
            .get(symbol)
            .filter(|entry| entry.last_fetch_at.elapsed() < self.rate_limit)
            .map(|entry| entry.last_volume)
    }

    async fn fetch(&self, symbol: &str) -> Result<Quote, ProviderError> {
        let quote = match timeout(self.upstream_timeout, self.provider.fetch_quote(symbol)).await {
            Ok(result) => result?,
            Err(_) => return Err(ProviderError::Timeout),
        };

        if !quote.price.is_finite() || quote.price <= 0.0 {
            return Err(ProviderError::BadResponse(format!(
                "unusable price {} for {}",
                quote.price, symbol
            )));
        }
        Ok(quote)
    }
}

/// Per-symbol fetch lock. The map guard is released before the caller awaits the lock.
fn fetch_lock(locks: &DashMap<String, Arc<Mutex<()>>>, symbol: &str) -> Arc<Mutex<()>> {
    locks.entry(symbol.to_string()).or_default().clone()
}
