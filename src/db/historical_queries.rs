use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::error;

use crate::models::{HistoricalPoint, PriceStatistics};

pub async fn insert(pool: &PgPool, point: &HistoricalPoint) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO historical_stock_prices (id, symbol, price, volume, recorded_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(point.id)
    .bind(&point.symbol)
    .bind(point.price)
    .bind(point.volume)
    .bind(point.timestamp)
    .execute(pool)
    .await
    .map_err(|e| {
        error!(
            "Failed to insert observation for {} (price: {}, at: {}): {}",
            point.symbol, point.price, point.timestamp, e
        );
        e
    })?;

    Ok(())
}

/// Observations for `symbol` with `start <= recorded_at <= end`, oldest first.
pub async fn fetch_range(
    pool: &PgPool,
    symbol: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<HistoricalPoint>, sqlx::Error> {
    sqlx::query_as::<_, HistoricalPoint>(
        r#"
        SELECT id, symbol, price, volume, recorded_at
        FROM historical_stock_prices
        WHERE symbol = $1 AND recorded_at BETWEEN $2 AND $3
        ORDER BY recorded_at ASC
        "#,
    )
    .bind(symbol)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
}

/// The most recent `limit` observations for `symbol`, newest first.
pub async fn fetch_recent(
    pool: &PgPool,
    symbol: &str,
    limit: i64,
) -> Result<Vec<HistoricalPoint>, sqlx::Error> {
    sqlx::query_as::<_, HistoricalPoint>(
        r#"
        SELECT id, symbol, price, volume, recorded_at
        FROM historical_stock_prices
        WHERE symbol = $1
        ORDER BY recorded_at DESC
        LIMIT $2
        "#,
    )
    .bind(symbol)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn fetch_statistics(
    pool: &PgPool,
    symbol: &str,
    since: DateTime<Utc>,
) -> Result<PriceStatistics, sqlx::Error> {
    sqlx::query_as::<_, PriceStatistics>(
        r#"
        SELECT AVG(price) AS average, MAX(price) AS max, MIN(price) AS min
        FROM historical_stock_prices
        WHERE symbol = $1 AND recorded_at >= $2
        "#,
    )
    .bind(symbol)
    .bind(since)
    .fetch_one(pool)
    .await
}
