mod analysis;
mod historical_point;
mod price_snapshot;
mod timeframe;

pub use analysis::{
    AnalysisStatus, MovingAverageAnalysis, RiskLevel, Signal, TechnicalIndicators,
    TrendAnalysis, VolatilityAnalysis, VolumeAnalysis, VolumeTrend,
};
pub use historical_point::{HistoricalPoint, PriceStatistics};
pub use price_snapshot::PriceSnapshot;
pub use timeframe::Timeframe;
