use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// One stored observation for a symbol. Rows are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct HistoricalPoint {
    pub id: Uuid,
    pub symbol: String,
    pub price: f64,
    pub volume: f64,
    #[sqlx(rename = "recorded_at")]
    pub timestamp: DateTime<Utc>,
}

impl HistoricalPoint {
    pub fn new(symbol: &str, price: f64, volume: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            price,
            volume,
            timestamp,
        }
    }
}

/// Price aggregates since a point in time. All fields are `None` when no rows match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PriceStatistics {
    pub average: Option<f64>,
    pub max: Option<f64>,
    pub min: Option<f64>,
}
