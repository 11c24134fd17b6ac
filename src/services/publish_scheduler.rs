use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::models::PriceSnapshot;
use crate::services::price_cache::PriceCache;
use crate::services::publisher::{PublishError, Publisher};
use crate::services::symbol_universe::SymbolUniverse;

/// Number of whole tick intervals since the Unix epoch.
pub fn tick_index_at(now: DateTime<Utc>, tick_interval: Duration) -> u64 {
    let millis = now.timestamp_millis().max(0) as u64;
    let interval = (tick_interval.as_millis() as u64).max(1);
    millis / interval
}

/// Rotation cursor for a tick: each tick starts where the previous batch ended, so
/// `ceil(len / batch_size)` consecutive ticks cover the whole universe. `len` must be non-zero.
pub fn rotation_start(tick_index: u64, batch_size: usize, len: usize) -> usize {
    let len = len as u64;
    let step = batch_size as u64 % len;
    ((tick_index % len) * step % len) as usize
}

/// Up to `batch_size` symbols starting at `start`, wrapping around the end of the list.
/// Never returns the same symbol twice.
pub fn select_batch(symbols: &[String], start: usize, batch_size: usize) -> Vec<String> {
    let len = symbols.len();
    if len == 0 {
        return Vec::new();
    }
    (0..batch_size.min(len))
        .map(|offset| symbols[(start + offset) % len].clone())
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub selected: Vec<String>,
    pub published: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Picks a rotating batch of symbols every tick and emits their snapshots.
pub struct PublishScheduler {
    universe: Arc<SymbolUniverse>,
    cache: PriceCache,
    publisher: Arc<dyn Publisher>,
    tick_interval: Duration,
    batch_size: usize,
}

impl PublishScheduler {
    pub fn new(
        universe: Arc<SymbolUniverse>,
        cache: PriceCache,
        publisher: Arc<dyn Publisher>,
        tick_interval: Duration,
        batch_size: usize,
    ) -> Self {
        Self {
            universe,
            cache,
            publisher,
            tick_interval,
            batch_size,
        }
    }

    pub async fn tick(&self) -> TickReport {
        self.tick_at(Utc::now()).await
    }

    pub async fn tick_at(&self, now: DateTime<Utc>) -> TickReport {
        let symbols = self.universe.snapshot();
        if symbols.is_empty() {
            info!("Symbol universe is empty, refreshing before publishing");
            if let Err(e) = self.universe.refresh().await {
                warn!("Universe refresh from publish tick failed: {}", e);
            }
            return TickReport::default();
        }

        let tick_index = tick_index_at(now, self.tick_interval);
        let start = rotation_start(tick_index, self.batch_size, symbols.len());
        let selected = select_batch(&symbols, start, self.batch_size);
        debug!("Tick selected {:?} (start {})", selected, start);

        let lookups = join_all(selected.iter().map(|symbol| self.cache.lookup_quote(symbol))).await;

        let mut report = TickReport {
            selected: selected.clone(),
            ..TickReport::default()
        };

        for (symbol, lookup) in selected.iter().zip(lookups) {
            let quote = match lookup.into_value() {
                Some(quote) if quote.price > 0.0 => quote,
                _ => {
                    debug!("No usable price for {}, skipping", symbol);
                    report.skipped += 1;
                    continue;
                }
            };

            let snapshot = PriceSnapshot::from_quote(symbol, &quote, now);
            match self.emit(symbol, &snapshot).await {
                Ok(()) => report.published += 1,
                Err(e) => {
                    error!("Failed to publish snapshot for {}: {}", symbol, e);
                    report.failed += 1;
                }
            }
        }

        report
    }

    async fn emit(&self, symbol: &str, snapshot: &PriceSnapshot) -> Result<(), PublishError> {
        let payload = serde_json::to_string(snapshot)?;
        self.publisher.publish(symbol, payload).await
    }
}
