use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::{
    MovingAverageAnalysis, TechnicalIndicators, Timeframe, TrendAnalysis, VolatilityAnalysis,
    VolumeAnalysis,
};
use crate::routes::normalize_symbol;
use crate::services::analytics_service::MAX_LOOKBACK_DAYS;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trend/:symbol", get(get_trend))
        .route("/volatility/:symbol", get(get_volatility))
        .route("/moving-average/:symbol", get(get_moving_averages))
        .route("/volume-analysis/:symbol", get(get_volume_analysis))
        .route("/technical-indicators/:symbol", get(get_technical_indicators))
}

#[derive(Debug, Deserialize)]
pub struct TimeframeParams {
    #[serde(default)]
    pub timeframe: Option<String>,
}

impl TimeframeParams {
    fn timeframe(&self) -> Timeframe {
        self.timeframe
            .as_deref()
            .map(Timeframe::parse)
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovingAverageParams {
    #[serde(default = "default_short_period")]
    pub short_period: usize,
    #[serde(default = "default_long_period")]
    pub long_period: usize,
}

fn default_short_period() -> usize {
    20
}

fn default_long_period() -> usize {
    50
}

#[derive(Debug, Deserialize)]
pub struct IndicatorParams {
    #[serde(default = "default_indicator_period")]
    pub period: usize,
}

fn default_indicator_period() -> usize {
    14
}

fn check_period(name: &str, value: usize) -> Result<usize, AppError> {
    if value as i64 > MAX_LOOKBACK_DAYS {
        return Err(AppError::Validation(format!(
            "{} must be at most {}",
            name, MAX_LOOKBACK_DAYS
        )));
    }
    Ok(value)
}

pub async fn get_trend(
    Path(symbol): Path<String>,
    Query(params): Query<TimeframeParams>,
    State(state): State<AppState>,
) -> Result<Json<TrendAnalysis>, AppError> {
    let symbol = normalize_symbol(&symbol)?;
    let timeframe = params.timeframe();
    info!("GET /analysis/trend/{} - timeframe {}", symbol, timeframe);
    Ok(Json(state.analytics.analyze_trend(&symbol, timeframe).await))
}

pub async fn get_volatility(
    Path(symbol): Path<String>,
    Query(params): Query<TimeframeParams>,
    State(state): State<AppState>,
) -> Result<Json<VolatilityAnalysis>, AppError> {
    let symbol = normalize_symbol(&symbol)?;
    let timeframe = params.timeframe();
    info!("GET /analysis/volatility/{} - timeframe {}", symbol, timeframe);
    Ok(Json(state.analytics.calculate_volatility(&symbol, timeframe).await))
}

pub async fn get_moving_averages(
    Path(symbol): Path<String>,
    Query(params): Query<MovingAverageParams>,
    State(state): State<AppState>,
) -> Result<Json<MovingAverageAnalysis>, AppError> {
    let symbol = normalize_symbol(&symbol)?;
    let short_period = check_period("shortPeriod", params.short_period)?;
    let long_period = check_period("longPeriod", params.long_period)?;
    info!(
        "GET /analysis/moving-average/{} - short {} long {}",
        symbol, short_period, long_period
    );
    Ok(Json(
        state
            .analytics
            .calculate_moving_averages(&symbol, short_period, long_period)
            .await,
    ))
}

pub async fn get_volume_analysis(
    Path(symbol): Path<String>,
    Query(params): Query<TimeframeParams>,
    State(state): State<AppState>,
) -> Result<Json<VolumeAnalysis>, AppError> {
    let symbol = normalize_symbol(&symbol)?;
    let timeframe = params.timeframe();
    info!("GET /analysis/volume-analysis/{} - timeframe {}", symbol, timeframe);
    Ok(Json(state.analytics.analyze_volume(&symbol, timeframe).await))
}

pub async fn get_technical_indicators(
    Path(symbol): Path<String>,
    Query(params): Query<IndicatorParams>,
    State(state): State<AppState>,
) -> Result<Json<TechnicalIndicators>, AppError> {
    let symbol = normalize_symbol(&symbol)?;
    let period = check_period("period", params.period)?;
    info!("GET /analysis/technical-indicators/{} - period {}", symbol, period);
    Ok(Json(
        state
            .analytics
            .calculate_technical_indicators(&symbol, period)
            .await,
    ))
}
