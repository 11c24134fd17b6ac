use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::db::historical_queries;
use crate::errors::AppError;
use crate::models::{HistoricalPoint, PriceStatistics};
use crate::store::HistoricalStore;

#[derive(Clone)]
pub struct PgHistoricalStore {
    pool: PgPool,
}

impl PgHistoricalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl HistoricalStore for PgHistoricalStore {
    async fn append(
        &self,
        symbol: &str,
        price: f64,
        volume: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<HistoricalPoint, AppError> {
        let point = HistoricalPoint::new(symbol, price, volume, timestamp);
        historical_queries::insert(&self.pool, &point).await?;
        Ok(point)
    }

    async fn query_range(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HistoricalPoint>, AppError> {
        Ok(historical_queries::fetch_range(&self.pool, symbol, start, end).await?)
    }

    async fn query_recent(
        &self,
        symbol: &str,
        limit: i64,
    ) -> Result<Vec<HistoricalPoint>, AppError> {
        Ok(historical_queries::fetch_recent(&self.pool, symbol, limit).await?)
    }

    async fn aggregate(
        &self,
        symbol: &str,
        since: DateTime<Utc>,
    ) -> Result<PriceStatistics, AppError> {
        Ok(historical_queries::fetch_statistics(&self.pool, symbol, since).await?)
    }
}
