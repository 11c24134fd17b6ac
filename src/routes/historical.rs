use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::{HistoricalPoint, PriceStatistics};
use crate::routes::normalize_symbol;
use crate::services::historical_service;
use crate::state::AppState;

const DEFAULT_RECENT_LIMIT: i64 = 100;
const MAX_RECENT_LIMIT: i64 = 1000;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:symbol/recent", get(get_recent))
        .route("/:symbol/range", get(get_range))
        .route("/:symbol/statistics", get(get_statistics))
}

#[derive(Debug, Deserialize)]
pub struct RecentParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct StatisticsParams {
    pub since: Option<DateTime<Utc>>,
}

pub async fn get_recent(
    Path(symbol): Path<String>,
    Query(params): Query<RecentParams>,
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoricalPoint>>, AppError> {
    let symbol = normalize_symbol(&symbol)?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_RECENT_LIMIT);
    info!("GET /historical/{}/recent - limit {}", symbol, limit);

    let points = historical_service::get_recent_prices(state.store.as_ref(), &symbol, limit).await?;
    Ok(Json(points))
}

pub async fn get_range(
    Path(symbol): Path<String>,
    Query(params): Query<RangeParams>,
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoricalPoint>>, AppError> {
    let symbol = normalize_symbol(&symbol)?;
    info!(
        "GET /historical/{}/range - {} to {}",
        symbol, params.start, params.end
    );

    let points = historical_service::get_prices_in_range(
        state.store.as_ref(),
        &symbol,
        params.start,
        params.end,
    )
    .await?;
    Ok(Json(points))
}

/// Defaults to the last 24 hours when `since` is omitted.
pub async fn get_statistics(
    Path(symbol): Path<String>,
    Query(params): Query<StatisticsParams>,
    State(state): State<AppState>,
) -> Result<Json<PriceStatistics>, AppError> {
    let symbol = normalize_symbol(&symbol)?;
    let since = params
        .since
        .unwrap_or_else(|| Utc::now() - Duration::days(1));
    info!("GET /historical/{}/statistics - since {}", symbol, since);

    let stats = historical_service::get_price_statistics(state.store.as_ref(), &symbol, since).await?;
    Ok(Json(stats))
}
