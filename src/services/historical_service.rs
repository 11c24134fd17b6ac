use chrono::{DateTime, Utc};
use tracing::error;

use crate::errors::AppError;
use crate::models::{HistoricalPoint, PriceStatistics};
use crate::store::HistoricalStore;

pub async fn save_stock_price(
    store: &dyn HistoricalStore,
    symbol: &str,
    price: f64,
    volume: f64,
    timestamp: DateTime<Utc>,
) -> Result<HistoricalPoint, AppError> {
    store
        .append(symbol, price, volume, timestamp)
        .await
        .map_err(|e| {
            error!("Failed to save price for {}: {}", symbol, e);
            e
        })
}

/// Most recent points first.
pub async fn get_recent_prices(
    store: &dyn HistoricalStore,
    symbol: &str,
    limit: i64,
) -> Result<Vec<HistoricalPoint>, AppError> {
    store.query_recent(symbol, limit).await.map_err(|e| {
        error!("Failed to fetch recent prices for {}: {}", symbol, e);
        e
    })
}

pub async fn get_prices_in_range(
    store: &dyn HistoricalStore,
    symbol: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<HistoricalPoint>, AppError> {
    if start > end {
        return Err(AppError::Validation(format!(
            "start {} is after end {}",
            start.to_rfc3339(),
            end.to_rfc3339()
        )));
    }

    store.query_range(symbol, start, end).await.map_err(|e| {
        error!("Failed to fetch prices for {} between {} and {}: {}", symbol, start, end, e);
        e
    })
}

pub async fn get_price_statistics(
    store: &dyn HistoricalStore,
    symbol: &str,
    since: DateTime<Utc>,
) -> Result<PriceStatistics, AppError> {
    store.aggregate(symbol, since).await.map_err(|e| {
        error!("Failed to aggregate prices for {}: {}", symbol, e);
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryHistoricalStore;
    use chrono::Duration;

    #[tokio::test]
    async fn test_statistics_over_saved_prices() {
        let store = MemoryHistoricalStore::new();
        let now = Utc::now();
        for (i, price) in [10.0, 14.0, 12.0].into_iter().enumerate() {
            save_stock_price(&store, "AAA", price, 1.0, now - Duration::minutes(i as i64))
                .await
                .unwrap();
        }

        let stats = get_price_statistics(&store, "AAA", now - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(stats.average, Some(12.0));
        assert_eq!(stats.max, Some(14.0));
        assert_eq!(stats.min, Some(10.0));

        let empty = get_price_statistics(&store, "ZZZ", now - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(empty, PriceStatistics::default());
    }

    #[tokio::test]
    async fn test_recent_prices_newest_first() {
        let store = MemoryHistoricalStore::new();
        let now = Utc::now();
        save_stock_price(&store, "AAA", 1.0, 0.0, now - Duration::minutes(5)).await.unwrap();
        save_stock_price(&store, "AAA", 2.0, 0.0, now).await.unwrap();

        let recent = get_recent_prices(&store, "AAA", 1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].price, 2.0);
    }

    #[tokio::test]
    async fn test_inverted_range_is_rejected() {
        let store = MemoryHistoricalStore::new();
        let now = Utc::now();

        let result = get_prices_in_range(&store, "AAA", now, now - Duration::days(1)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
