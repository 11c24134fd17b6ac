use axum::Router;
use tower_http::cors::CorsLayer;

use crate::routes::{analysis, health, historical, prices};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/v1/analysis", analysis::router())
        .nest("/api/historical", historical::router())
        .nest("/api/prices", prices::router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
