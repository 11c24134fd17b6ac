use std::sync::Arc;

use crate::services::analytics_service::AnalyticsEngine;
use crate::services::price_cache::PriceCache;
use crate::services::symbol_universe::SymbolUniverse;
use crate::store::HistoricalStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn HistoricalStore>,
    pub analytics: AnalyticsEngine,
    pub price_cache: PriceCache,
    pub universe: Arc<SymbolUniverse>,
}
