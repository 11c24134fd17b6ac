use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::errors::AppError;
use crate::models::{HistoricalPoint, PriceStatistics};
use crate::store::HistoricalStore;

/// Process-local store. History is lost on restart.
#[derive(Default)]
pub struct MemoryHistoricalStore {
    points: RwLock<Vec<HistoricalPoint>>,
}

impl MemoryHistoricalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.read().is_empty()
    }

    fn for_symbol<P>(&self, symbol: &str, keep: P) -> Vec<HistoricalPoint>
    where
        P: Fn(&HistoricalPoint) -> bool,
    {
        self.points
            .read()
            .iter()
            .filter(|p| p.symbol == symbol && keep(p))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl HistoricalStore for MemoryHistoricalStore {
    async fn append(
        &self,
        symbol: &str,
        price: f64,
        volume: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<HistoricalPoint, AppError> {
        let point = HistoricalPoint::new(symbol, price, volume, timestamp);
        self.points.write().push(point.clone());
        Ok(point)
    }

    async fn query_range(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HistoricalPoint>, AppError> {
        let mut points = self.for_symbol(symbol, |p| p.timestamp >= start && p.timestamp <= end);
        points.sort_by_key(|p| p.timestamp);
        Ok(points)
    }

    async fn query_recent(
        &self,
        symbol: &str,
        limit: i64,
    ) -> Result<Vec<HistoricalPoint>, AppError> {
        let mut points = self.for_symbol(symbol, |_| true);
        points.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        points.truncate(limit.max(0) as usize);
        Ok(points)
    }

    async fn aggregate(
        &self,
        symbol: &str,
        since: DateTime<Utc>,
    ) -> Result<PriceStatistics, AppError> {
        let prices: Vec<f64> = self
            .for_symbol(symbol, |p| p.timestamp >= since)
            .iter()
            .map(|p| p.price)
            .collect();

        if prices.is_empty() {
            return Ok(PriceStatistics::default());
        }

        Ok(PriceStatistics {
            average: Some(prices.iter().sum::<f64>() / prices.len() as f64),
            max: prices.iter().copied().reduce(f64::max),
            min: prices.iter().copied().reduce(f64::min),
        })
    }
}
