use axum::extract::State;
use axum::routing::get;
use axum::Router;
use tracing::debug;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health))
}

async fn health(State(state): State<AppState>) -> &'static str {
    debug!(
        "GET /health - {} symbols, {} cached prices",
        state.universe.len(),
        state.price_cache.len()
    );
    "OK"
}
