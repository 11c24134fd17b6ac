use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use regex::Regex;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use crate::external::price_provider::{ListingProvider, ProviderError};

fn ticker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Z0-9][A-Z0-9.\-]{0,14}$").expect("ticker pattern is a valid regex")
    })
}

pub fn is_valid_symbol(symbol: &str) -> bool {
    ticker_pattern().is_match(symbol)
}

/// Trims, validates and de-duplicates a raw listing, keeping first-seen order.
pub fn normalize_symbols(raw: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut symbols = Vec::with_capacity(raw.len());

    for symbol in raw {
        let symbol = symbol.trim();
        if !is_valid_symbol(symbol) {
            debug!("Dropping listing entry {:?}", symbol);
            continue;
        }
        if seen.insert(symbol.to_string()) {
            symbols.push(symbol.to_string());
        }
    }
    symbols
}

/// The tradable symbol list. Readers get a snapshot; a refresh swaps the whole list.
pub struct SymbolUniverse {
    provider: Arc<dyn ListingProvider>,
    symbols: RwLock<Arc<Vec<String>>>,
    upstream_timeout: Duration,
}

impl SymbolUniverse {
    pub fn new(provider: Arc<dyn ListingProvider>, upstream_timeout: Duration) -> Self {
        Self {
            provider,
            symbols: RwLock::new(Arc::new(Vec::new())),
            upstream_timeout,
        }
    }

    pub fn snapshot(&self) -> Arc<Vec<String>> {
        self.symbols.read().clone()
    }

    pub fn len(&self) -> usize {
        self.symbols.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.read().is_empty()
    }

    /// Reloads the listing. On failure, or when the listing comes back empty, the
    /// previous list stays in effect.
    pub async fn refresh(&self) -> Result<usize, ProviderError> {
        let raw = match timeout(self.upstream_timeout, self.provider.fetch_symbols()).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!("⚠️  Symbol universe refresh failed, keeping {} symbols: {}", self.len(), e);
                return Err(e);
            }
            Err(_) => {
                warn!("⚠️  Symbol universe refresh timed out, keeping {} symbols", self.len());
                return Err(ProviderError::Timeout);
            }
        };

        let symbols = normalize_symbols(raw);
        if symbols.is_empty() {
            warn!("⚠️  Listing returned no usable symbols, keeping {} symbols", self.len());
            return Err(ProviderError::BadResponse("empty listing".into()));
        }

        let count = symbols.len();
        *self.symbols.write() = Arc::new(symbols);
        info!("🔄 Symbol universe refreshed: {} symbols", count);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct StubListing {
        response: Mutex<Result<Vec<String>, ProviderError>>,
    }

    impl StubListing {
        fn returning(symbols: &[&str]) -> Self {
            Self {
                response: Mutex::new(Ok(symbols.iter().map(|s| s.to_string()).collect())),
            }
        }

        fn set(&self, response: Result<Vec<String>, ProviderError>) {
            *self.response.lock() = response;
        }
    }

    #[async_trait]
    impl ListingProvider for StubListing {
        async fn fetch_symbols(&self) -> Result<Vec<String>, ProviderError> {
            self.response.lock().clone()
        }
    }

    #[test]
    fn test_normalize_trims_filters_and_dedups() {
        let raw = vec![" AAPL ", "msft", "BRK.B", "", "AAPL", "TOO-LONG-SYMBOL-X", "-BAD", "RDS-A"]
            .into_iter()
            .map(String::from)
            .collect();

        assert_eq!(normalize_symbols(raw), vec!["AAPL", "BRK.B", "RDS-A"]);
    }

    #[tokio::test]
    async fn test_refresh_swaps_list() {
        let stub = Arc::new(StubListing::returning(&["AAA", "BBB"]));
        let universe = SymbolUniverse::new(stub.clone(), Duration::from_secs(1));
        assert!(universe.is_empty());

        assert_eq!(universe.refresh().await, Ok(2));
        let before = universe.snapshot();

        stub.set(Ok(vec!["CCC".into()]));
        universe.refresh().await.unwrap();

        assert_eq!(*before, vec!["AAA", "BBB"]);
        assert_eq!(*universe.snapshot(), vec!["CCC"]);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_list() {
        let stub = Arc::new(StubListing::returning(&["AAA", "BBB"]));
        let universe = SymbolUniverse::new(stub.clone(), Duration::from_secs(1));
        universe.refresh().await.unwrap();

        stub.set(Err(ProviderError::RateLimited));
        assert_eq!(universe.refresh().await, Err(ProviderError::RateLimited));
        assert_eq!(universe.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_listing_keeps_previous_list() {
        let stub = Arc::new(StubListing::returning(&["AAA"]));
        let universe = SymbolUniverse::new(stub.clone(), Duration::from_secs(1));
        universe.refresh().await.unwrap();

        stub.set(Ok(vec!["lowercase".into()]));
        assert!(universe.refresh().await.is_err());
        assert_eq!(*universe.snapshot(), vec!["AAA"]);
    }
}
