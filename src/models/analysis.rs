use serde::{Deserialize, Serialize};

use crate::models::Timeframe;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn from_volatility(volatility: f64) -> Self {
        if volatility < 0.01 {
            RiskLevel::Low
        } else if volatility < 0.02 {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolumeTrend {
    Increasing,
    Decreasing,
    Stable,
    Neutral,
}

/// How an analysis result was arrived at.
///
/// Neutral defaults look the same whether they were computed or forced, so every
/// result carries this marker next to its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Computed from enough stored data and a usable upstream value.
    Computed,
    /// The window held too few observations; values are the documented defaults.
    InsufficientData,
    /// Computed, but with a stand-in for an upstream value that was unavailable.
    Degraded,
    /// The historical store could not be read; values are the documented defaults.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub trend: Signal,
    pub strength: f64,
    pub percent_change: Option<f64>,
    pub status: AnalysisStatus,
}

impl TrendAnalysis {
    pub fn neutral(symbol: &str, timeframe: Timeframe, status: AnalysisStatus) -> Self {
        Self {
            symbol: symbol.to_string(),
            timeframe,
            trend: Signal::Neutral,
            strength: 0.5,
            percent_change: None,
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityAnalysis {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub volatility: f64,
    pub risk_level: RiskLevel,
    pub status: AnalysisStatus,
}

impl VolatilityAnalysis {
    pub fn calm(symbol: &str, timeframe: Timeframe, status: AnalysisStatus) -> Self {
        Self {
            symbol: symbol.to_string(),
            timeframe,
            volatility: 0.0,
            risk_level: RiskLevel::Low,
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverageAnalysis {
    pub symbol: String,
    pub short_period: usize,
    pub long_period: usize,
    pub short_ma: f64,
    pub long_ma: f64,
    pub signal: Signal,
    pub status: AnalysisStatus,
}

impl MovingAverageAnalysis {
    pub fn neutral(
        symbol: &str,
        short_period: usize,
        long_period: usize,
        status: AnalysisStatus,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            short_period,
            long_period,
            short_ma: 0.0,
            long_ma: 0.0,
            signal: Signal::Neutral,
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeAnalysis {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub average_volume: f64,
    pub current_volume: f64,
    pub volume_trend: VolumeTrend,
    pub status: AnalysisStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalIndicators {
    pub symbol: String,
    pub period: usize,
    pub rsi: f64,
    pub macd: f64,
    pub signal: Signal,
    pub status: AnalysisStatus,
}

impl TechnicalIndicators {
    pub fn neutral(symbol: &str, period: usize, status: AnalysisStatus) -> Self {
        Self {
            symbol: symbol.to_string(),
            period,
            rsi: 50.0,
            macd: 0.0,
            signal: Signal::Neutral,
            status,
        }
    }
}
