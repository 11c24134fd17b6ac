//! Historical time-series storage.
//!
//! Analytics and the inbound consumer only see the [`HistoricalStore`] trait. Postgres backs it
//! in production; the in-memory store is used when no database is configured, and in tests.

mod memory;
mod postgres;

pub use memory::MemoryHistoricalStore;
pub use postgres::PgHistoricalStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::AppError;
use crate::models::{HistoricalPoint, PriceStatistics};

#[async_trait]
pub trait HistoricalStore: Send + Sync {
    async fn append(
        &self,
        symbol: &str,
        price: f64,
        volume: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<HistoricalPoint, AppError>;

    /// Inclusive on both ends, ascending by timestamp.
    async fn query_range(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HistoricalPoint>, AppError>;

    /// Descending by timestamp.
    async fn query_recent(&self, symbol: &str, limit: i64)
        -> Result<Vec<HistoricalPoint>, AppError>;

    async fn aggregate(
        &self,
        symbol: &str,
        since: DateTime<Utc>,
    ) -> Result<PriceStatistics, AppError>;
}
