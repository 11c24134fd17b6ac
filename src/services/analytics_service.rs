use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, error};

use crate::errors::AppError;
use crate::models::{
    AnalysisStatus, HistoricalPoint, MovingAverageAnalysis, RiskLevel, Signal,
    TechnicalIndicators, Timeframe, TrendAnalysis, VolatilityAnalysis, VolumeAnalysis,
    VolumeTrend,
};
use crate::services::indicators;
use crate::services::price_cache::{Lookup, PriceCache};
use crate::store::HistoricalStore;

/// Longest lookback, in days, any period-based query will request from the store.
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

const TREND_THRESHOLD_PCT: f64 = 2.0;
const VOLUME_HIGH_RATIO: f64 = 1.2;
const VOLUME_LOW_RATIO: f64 = 0.8;

pub fn classify_trend(percent_change: f64) -> (Signal, f64) {
    let strength = (0.5 + percent_change.abs() / 100.0).min(1.0);
    if percent_change > TREND_THRESHOLD_PCT {
        (Signal::Bullish, strength)
    } else if percent_change < -TREND_THRESHOLD_PCT {
        (Signal::Bearish, strength)
    } else {
        (Signal::Neutral, 0.5)
    }
}

pub fn moving_average_signal(short_ma: f64, long_ma: f64) -> Signal {
    if short_ma > long_ma {
        Signal::Bullish
    } else if short_ma < long_ma {
        Signal::Bearish
    } else {
        Signal::Neutral
    }
}

pub fn volume_signal(current: f64, average: f64) -> VolumeTrend {
    if current > average * VOLUME_HIGH_RATIO {
        VolumeTrend::Increasing
    } else if current < average * VOLUME_LOW_RATIO {
        VolumeTrend::Decreasing
    } else {
        VolumeTrend::Stable
    }
}

/// RSI/MACD composite. Overbought and oversold take precedence over momentum.
pub fn composite_signal(rsi: f64, macd: f64) -> Signal {
    if rsi > 70.0 && macd > 0.0 {
        Signal::Bearish
    } else if rsi < 30.0 && macd < 0.0 {
        Signal::Bullish
    } else if rsi > 50.0 && macd > 0.0 {
        Signal::Bullish
    } else if rsi < 50.0 && macd < 0.0 {
        Signal::Bearish
    } else {
        Signal::Neutral
    }
}

fn lookback_days(days: usize) -> Duration {
    Duration::days((days as i64).min(MAX_LOOKBACK_DAYS))
}

fn prices_of(points: &[HistoricalPoint]) -> Vec<f64> {
    points.iter().map(|p| p.price).collect()
}

/// Trading analytics over the stored price series.
///
/// Every query degrades to neutral values instead of failing; the `status` field of each
/// result says which path produced it.
#[derive(Clone)]
pub struct AnalyticsEngine {
    store: Arc<dyn HistoricalStore>,
    prices: PriceCache,
}

impl AnalyticsEngine {
    pub fn new(store: Arc<dyn HistoricalStore>, prices: PriceCache) -> Self {
        Self { store, prices }
    }

    async fn load_window(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HistoricalPoint>, AppError> {
        self.store.query_range(symbol, start, end).await.map_err(|e| {
            error!("Failed to load price window for {}: {}", symbol, e);
            e
        })
    }

    pub async fn analyze_trend(&self, symbol: &str, timeframe: Timeframe) -> TrendAnalysis {
        let (start, end) = timeframe.window_ending(Utc::now());
        let points = match self.load_window(symbol, start, end).await {
            Ok(points) => points,
            Err(_) => return TrendAnalysis::neutral(symbol, timeframe, AnalysisStatus::Unavailable),
        };

        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            return TrendAnalysis::neutral(symbol, timeframe, AnalysisStatus::InsufficientData);
        };
        if first.price == 0.0 {
            return TrendAnalysis::neutral(symbol, timeframe, AnalysisStatus::InsufficientData);
        }

        let (current, status) = match self.prices.lookup_price(symbol).await {
            Lookup::Live(price) | Lookup::Cached(price) => (price, AnalysisStatus::Computed),
            Lookup::Stale(price) => {
                debug!("Upstream down for {}, using last cached price", symbol);
                (price, AnalysisStatus::Degraded)
            }
            Lookup::Missing => {
                debug!("No price ever cached for {}, using last stored price", symbol);
                (last.price, AnalysisStatus::Degraded)
            }
        };

        let percent_change = (current - first.price) / first.price * 100.0;
        let (trend, strength) = classify_trend(percent_change);

        TrendAnalysis {
            symbol: symbol.to_string(),
            timeframe,
            trend,
            strength,
            percent_change: Some(percent_change),
            status,
        }
    }

    pub async fn calculate_volatility(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> VolatilityAnalysis {
        let (start, end) = timeframe.window_ending(Utc::now());
        let points = match self.load_window(symbol, start, end).await {
            Ok(points) => points,
            Err(_) => {
                return VolatilityAnalysis::calm(symbol, timeframe, AnalysisStatus::Unavailable)
            }
        };

        if points.len() < 2 {
            return VolatilityAnalysis::calm(symbol, timeframe, AnalysisStatus::InsufficientData);
        }

        let volatility = indicators::volatility(&prices_of(&points));
        VolatilityAnalysis {
            symbol: symbol.to_string(),
            timeframe,
            volatility,
            risk_level: RiskLevel::from_volatility(volatility),
            status: AnalysisStatus::Computed,
        }
    }

    pub async fn calculate_moving_averages(
        &self,
        symbol: &str,
        short_period: usize,
        long_period: usize,
    ) -> MovingAverageAnalysis {
        let end = Utc::now();
        let start = end - lookback_days(long_period);
        let points = match self.load_window(symbol, start, end).await {
            Ok(points) => points,
            Err(_) => {
                return MovingAverageAnalysis::neutral(
                    symbol,
                    short_period,
                    long_period,
                    AnalysisStatus::Unavailable,
                )
            }
        };

        let prices = prices_of(&points);
        match (
            indicators::sma_tail(&prices, short_period),
            indicators::sma_tail(&prices, long_period),
        ) {
            (Some(short_ma), Some(long_ma)) => MovingAverageAnalysis {
                symbol: symbol.to_string(),
                short_period,
                long_period,
                short_ma,
                long_ma,
                signal: moving_average_signal(short_ma, long_ma),
                status: AnalysisStatus::Computed,
            },
            _ => MovingAverageAnalysis::neutral(
                symbol,
                short_period,
                long_period,
                AnalysisStatus::InsufficientData,
            ),
        }
    }

    pub async fn analyze_volume(&self, symbol: &str, timeframe: Timeframe) -> VolumeAnalysis {
        let (start, end) = timeframe.window_ending(Utc::now());
        let result = |average_volume, current_volume, volume_trend, status| VolumeAnalysis {
            symbol: symbol.to_string(),
            timeframe,
            average_volume,
            current_volume,
            volume_trend,
            status,
        };

        let points = match self.load_window(symbol, start, end).await {
            Ok(points) => points,
            Err(_) => {
                return result(0.0, 0.0, VolumeTrend::Neutral, AnalysisStatus::Unavailable)
            }
        };
        let volumes: Vec<f64> = points.iter().map(|p| p.volume).collect();
        let average = indicators::mean(&volumes);

        match (self.prices.lookup_volume(symbol).await, average) {
            (Lookup::Live(current), Some(average)) => result(
                average,
                current,
                volume_signal(current, average),
                AnalysisStatus::Computed,
            ),
            (Lookup::Live(current), None) => result(
                current,
                current,
                VolumeTrend::Neutral,
                AnalysisStatus::InsufficientData,
            ),
            (_, Some(average)) => {
                debug!("Volume for {} not live, using historical average", symbol);
                result(average, average, VolumeTrend::Neutral, AnalysisStatus::Degraded)
            }
            (_, None) => result(0.0, 0.0, VolumeTrend::Neutral, AnalysisStatus::InsufficientData),
        }
    }

    pub async fn calculate_technical_indicators(
        &self,
        symbol: &str,
        period: usize,
    ) -> TechnicalIndicators {
        let end = Utc::now();
        let start = end - lookback_days(period.saturating_mul(2));
        let points = match self.load_window(symbol, start, end).await {
            Ok(points) => points,
            Err(_) => {
                return TechnicalIndicators::neutral(symbol, period, AnalysisStatus::Unavailable)
            }
        };

        let prices = prices_of(&points);
        let Some(rsi) = indicators::rsi(&prices, period) else {
            return TechnicalIndicators::neutral(symbol, period, AnalysisStatus::InsufficientData);
        };
        let macd = indicators::macd(&prices).histogram;

        TechnicalIndicators {
            symbol: symbol.to_string(),
            period,
            rsi,
            macd,
            signal: composite_signal(rsi, macd),
            status: AnalysisStatus::Computed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::price_provider::{ProviderError, Quote, QuoteProvider};
    use crate::models::PriceStatistics;
    use crate::store::MemoryHistoricalStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration as StdDuration;

    struct StubQuotes {
        quote: Option<Quote>,
        fail: AtomicBool,
        calls: AtomicUsize,
    }

    impl StubQuotes {
        fn live(price: f64, volume: f64) -> Arc<Self> {
            Arc::new(Self {
                quote: Some(Quote::new(price, volume)),
                fail: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            })
        }

        fn down() -> Arc<Self> {
            Arc::new(Self {
                quote: None,
                fail: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl QuoteProvider for StubQuotes {
        async fn fetch_quote(&self, _symbol: &str) -> Result<Quote, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(ProviderError::Network("connection reset".into()));
            }
            self.quote.clone().ok_or(ProviderError::RateLimited)
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl HistoricalStore for BrokenStore {
        async fn append(
            &self,
            _symbol: &str,
            _price: f64,
            _volume: f64,
            _timestamp: DateTime<Utc>,
        ) -> Result<HistoricalPoint, AppError> {
            Err(AppError::External("store offline".into()))
        }

        async fn query_range(
            &self,
            _symbol: &str,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Vec<HistoricalPoint>, AppError> {
            Err(AppError::External("store offline".into()))
        }

        async fn query_recent(
            &self,
            _symbol: &str,
            _limit: i64,
        ) -> Result<Vec<HistoricalPoint>, AppError> {
            Err(AppError::External("store offline".into()))
        }

        async fn aggregate(
            &self,
            _symbol: &str,
            _since: DateTime<Utc>,
        ) -> Result<PriceStatistics, AppError> {
            Err(AppError::External("store offline".into()))
        }
    }

    fn cache(provider: Arc<StubQuotes>) -> PriceCache {
        PriceCache::new(provider, StdDuration::from_secs(5), StdDuration::from_secs(1))
    }

    /// Stores `prices` one minute apart, oldest first, ending a minute ago.
    async fn seeded(symbol: &str, prices: &[f64], volume: f64) -> Arc<MemoryHistoricalStore> {
        let store = Arc::new(MemoryHistoricalStore::new());
        let now = Utc::now();
        let n = prices.len() as i64;
        for (i, &price) in prices.iter().enumerate() {
            let at = now - Duration::minutes(n - i as i64);
            store.append(symbol, price, volume, at).await.unwrap();
        }
        store
    }

    #[test]
    fn test_trend_classification() {
        assert_eq!(classify_trend(5.0), (Signal::Bullish, 0.55));
        assert_eq!(classify_trend(-10.0), (Signal::Bearish, 0.6));
        assert_eq!(classify_trend(2.0), (Signal::Neutral, 0.5));
        assert_eq!(classify_trend(250.0), (Signal::Bullish, 1.0));
    }

    #[test]
    fn test_composite_signal_precedence() {
        assert_eq!(composite_signal(75.0, 1.0), Signal::Bearish);
        assert_eq!(composite_signal(25.0, -1.0), Signal::Bullish);
        assert_eq!(composite_signal(60.0, 0.5), Signal::Bullish);
        assert_eq!(composite_signal(40.0, -0.5), Signal::Bearish);
        assert_eq!(composite_signal(75.0, -1.0), Signal::Neutral);
        assert_eq!(composite_signal(50.0, 0.0), Signal::Neutral);
    }

    #[test]
    fn test_volume_signal_thresholds() {
        assert_eq!(volume_signal(130.0, 100.0), VolumeTrend::Increasing);
        assert_eq!(volume_signal(70.0, 100.0), VolumeTrend::Decreasing);
        assert_eq!(volume_signal(100.0, 100.0), VolumeTrend::Stable);
        assert_eq!(volume_signal(120.0, 100.0), VolumeTrend::Stable);
    }

    #[tokio::test]
    async fn test_empty_trend_window_is_neutral_without_fetching() {
        let quotes = StubQuotes::live(500.0, 1.0);
        let engine = AnalyticsEngine::new(
            Arc::new(MemoryHistoricalStore::new()),
            cache(quotes.clone()),
        );

        let result = engine.analyze_trend("AAA", Timeframe::OneDay).await;

        assert_eq!(result.trend, Signal::Neutral);
        assert_eq!(result.strength, 0.5);
        assert_eq!(result.status, AnalysisStatus::InsufficientData);
        assert_eq!(quotes.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_trend_against_live_price() {
        let store = seeded("AAA", &[100.0, 101.0, 99.0], 10.0).await;
        let engine = AnalyticsEngine::new(store, cache(StubQuotes::live(110.0, 10.0)));

        let result = engine.analyze_trend("AAA", Timeframe::parse("bogus")).await;

        assert_eq!(result.timeframe, Timeframe::OneDay);
        assert_eq!(result.trend, Signal::Bullish);
        assert!((result.strength - 0.6).abs() < 1e-9);
        assert_eq!(result.status, AnalysisStatus::Computed);
    }

    #[tokio::test]
    async fn test_trend_falls_back_to_stored_price() {
        let store = seeded("AAA", &[100.0, 90.0], 10.0).await;
        let engine = AnalyticsEngine::new(store, cache(StubQuotes::down()));

        let result = engine.analyze_trend("AAA", Timeframe::OneWeek).await;

        assert_eq!(result.trend, Signal::Bearish);
        assert_eq!(result.percent_change, Some(-10.0));
        assert_eq!(result.status, AnalysisStatus::Degraded);
    }

    #[tokio::test]
    async fn test_trend_uses_stale_cached_price_over_stored_price() {
        let store = seeded("AAA", &[100.0, 90.0], 10.0).await;
        let quotes = StubQuotes::live(120.0, 10.0);
        // zero window so the trend query goes upstream again
        let prices = PriceCache::new(quotes.clone(), StdDuration::ZERO, StdDuration::from_secs(1));
        assert_eq!(prices.lookup_price("AAA").await, Lookup::Live(120.0));
        quotes.fail.store(true, Ordering::SeqCst);

        let engine = AnalyticsEngine::new(store, prices);
        let result = engine.analyze_trend("AAA", Timeframe::OneWeek).await;

        assert_eq!(result.trend, Signal::Bullish);
        assert!((result.percent_change.unwrap() - 20.0).abs() < 1e-9);
        assert_eq!(result.status, AnalysisStatus::Degraded);
        assert_eq!(quotes.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_store_failure_degrades_every_query() {
        let engine = AnalyticsEngine::new(Arc::new(BrokenStore), cache(StubQuotes::live(1.0, 1.0)));

        let trend = engine.analyze_trend("AAA", Timeframe::OneDay).await;
        assert_eq!(trend.trend, Signal::Neutral);
        assert_eq!(trend.status, AnalysisStatus::Unavailable);

        let volatility = engine.calculate_volatility("AAA", Timeframe::OneDay).await;
        assert_eq!(volatility.risk_level, RiskLevel::Low);
        assert_eq!(volatility.status, AnalysisStatus::Unavailable);

        let indicators = engine.calculate_technical_indicators("AAA", 14).await;
        assert_eq!(indicators.rsi, 50.0);
        assert_eq!(indicators.status, AnalysisStatus::Unavailable);
    }

    #[tokio::test]
    async fn test_volatility_of_reference_series() {
        let store = seeded("AAA", &[100.0, 102.0, 101.0, 105.0], 10.0).await;
        let engine = AnalyticsEngine::new(store, cache(StubQuotes::down()));

        let result = engine.calculate_volatility("AAA", Timeframe::OneDay).await;

        assert!((result.volatility - 0.020_313_454_228_698_492).abs() < 1e-12);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[tokio::test]
    async fn test_single_point_volatility_is_zero() {
        let store = seeded("AAA", &[100.0], 10.0).await;
        let engine = AnalyticsEngine::new(store, cache(StubQuotes::down()));

        let result = engine.calculate_volatility("AAA", Timeframe::OneDay).await;
        assert_eq!(result.volatility, 0.0);
        assert_eq!(result.status, AnalysisStatus::InsufficientData);
    }

    #[tokio::test]
    async fn test_moving_averages_need_long_period_points() {
        let store = seeded("AAA", &[10.0; 30], 10.0).await;
        let engine = AnalyticsEngine::new(store, cache(StubQuotes::down()));

        let result = engine.calculate_moving_averages("AAA", 20, 50).await;

        assert_eq!(result.short_ma, 0.0);
        assert_eq!(result.long_ma, 0.0);
        assert_eq!(result.signal, Signal::Neutral);
        assert_eq!(result.status, AnalysisStatus::InsufficientData);
    }

    #[tokio::test]
    async fn test_moving_average_crossover() {
        let prices: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        let store = seeded("AAA", &prices, 10.0).await;
        let engine = AnalyticsEngine::new(store, cache(StubQuotes::down()));

        let result = engine.calculate_moving_averages("AAA", 2, 10).await;

        assert_eq!(result.short_ma, 108.5);
        assert_eq!(result.long_ma, 104.5);
        assert_eq!(result.signal, Signal::Bullish);
    }

    #[tokio::test]
    async fn test_volume_against_live_volume() {
        let store = seeded("AAA", &[10.0, 11.0], 1_000.0).await;
        let engine = AnalyticsEngine::new(store, cache(StubQuotes::live(11.0, 1_500.0)));

        let result = engine.analyze_volume("AAA", Timeframe::OneDay).await;

        assert_eq!(result.average_volume, 1_000.0);
        assert_eq!(result.current_volume, 1_500.0);
        assert_eq!(result.volume_trend, VolumeTrend::Increasing);
        assert_eq!(result.status, AnalysisStatus::Computed);
    }

    #[tokio::test]
    async fn test_rate_limited_volume_uses_average() {
        let store = seeded("AAA", &[10.0, 11.0], 1_000.0).await;
        let engine = AnalyticsEngine::new(store, cache(StubQuotes::live(11.0, 5_000.0)));

        engine.analyze_volume("AAA", Timeframe::OneDay).await;
        let second = engine.analyze_volume("AAA", Timeframe::OneDay).await;

        assert_eq!(second.current_volume, 1_000.0);
        assert_eq!(second.volume_trend, VolumeTrend::Neutral);
        assert_eq!(second.status, AnalysisStatus::Degraded);
    }

    #[tokio::test]
    async fn test_live_volume_without_history() {
        let engine = AnalyticsEngine::new(
            Arc::new(MemoryHistoricalStore::new()),
            cache(StubQuotes::live(11.0, 700.0)),
        );

        let result = engine.analyze_volume("AAA", Timeframe::OneMonth).await;

        assert_eq!(result.average_volume, 700.0);
        assert_eq!(result.volume_trend, VolumeTrend::Neutral);
    }

    #[tokio::test]
    async fn test_technical_indicators_reference_series() {
        let store = seeded("AAA", &[100.0, 102.0, 101.0, 105.0], 10.0).await;
        let engine = AnalyticsEngine::new(store, cache(StubQuotes::down()));

        let result = engine.calculate_technical_indicators("AAA", 3).await;

        assert!((result.rsi - 85.714_285_714_285_71).abs() < 1e-9);
        assert!((result.macd - 0.390_096_331_173_171_16).abs() < 1e-9);
        assert_eq!(result.signal, Signal::Bearish);
        assert_eq!(result.status, AnalysisStatus::Computed);
    }

    #[tokio::test]
    async fn test_technical_indicators_short_series() {
        let store = seeded("AAA", &[100.0, 101.0], 10.0).await;
        let engine = AnalyticsEngine::new(store, cache(StubQuotes::down()));

        let result = engine.calculate_technical_indicators("AAA", 14).await;

        assert_eq!(result.rsi, 50.0);
        assert_eq!(result.macd, 0.0);
        assert_eq!(result.signal, Signal::Neutral);
    }
}
