use std::collections::BTreeMap;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cached_prices))
        .route("/universe", get(get_universe))
}

#[derive(Debug, Serialize)]
pub struct UniverseResponse {
    pub count: usize,
    pub symbols: Vec<String>,
}

/// Last known price for every symbol the cache has seen, sorted by symbol.
pub async fn get_cached_prices(State(state): State<AppState>) -> Json<BTreeMap<String, f64>> {
    info!("GET /prices - Listing cached prices");
    Json(state.price_cache.last_prices().into_iter().collect())
}

pub async fn get_universe(State(state): State<AppState>) -> Json<UniverseResponse> {
    info!("GET /prices/universe - Listing symbol universe");
    let symbols = state.universe.snapshot();
    Json(UniverseResponse {
        count: symbols.len(),
        symbols: symbols.as_ref().clone(),
    })
}
