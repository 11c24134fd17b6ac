use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use tickerflow::app;
use tickerflow::config::AppConfig;
use tickerflow::external::alphavantage::AlphaVantageListingProvider;
use tickerflow::external::yahoo::YahooProvider;
use tickerflow::logging::{self, LoggingConfig};
use tickerflow::services::analytics_service::AnalyticsEngine;
use tickerflow::services::consumer_service;
use tickerflow::services::job_scheduler_service::{JobContext, JobSchedule, JobSchedulerService};
use tickerflow::services::price_cache::PriceCache;
use tickerflow::services::publish_scheduler::PublishScheduler;
use tickerflow::services::publisher::BroadcastPublisher;
use tickerflow::services::symbol_universe::SymbolUniverse;
use tickerflow::state::AppState;
use tickerflow::store::{HistoricalStore, MemoryHistoricalStore, PgHistoricalStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    logging::init_logging(LoggingConfig::from_env())?;

    let config = AppConfig::from_env();
    config.validate().map_err(|e| anyhow::anyhow!("{}", e))?;

    let store: Arc<dyn HistoricalStore> = match config.database_url.as_deref() {
        Some(url) => {
            let store = PgHistoricalStore::connect(url, config.db_max_connections)
                .await
                .context("Failed to connect to DATABASE_URL")?;
            store
                .run_migrations()
                .await
                .context("Failed to run migrations")?;
            info!("🗄️  Using Postgres historical store");
            Arc::new(store)
        }
        None => {
            warn!("⚠️  DATABASE_URL not set, history is kept in memory only");
            Arc::new(MemoryHistoricalStore::new())
        }
    };

    let quotes = Arc::new(YahooProvider::new(config.upstream_timeout)?);
    let listing = Arc::new(AlphaVantageListingProvider::new(
        config.alphavantage_api_key.clone(),
        config.upstream_timeout,
    )?);
    info!("📊 Quotes from Yahoo Finance, listing from Alpha Vantage");

    let price_cache = PriceCache::new(quotes, config.rate_limit, config.upstream_timeout);
    let universe = Arc::new(SymbolUniverse::new(listing, config.upstream_timeout));

    let publisher = BroadcastPublisher::new(&config.publish_topic, config.channel_capacity);
    let consumer = consumer_service::spawn(publisher.subscribe(), store.clone());
    info!("📨 Publishing to topic '{}'", publisher.topic());

    let publish_scheduler = Arc::new(PublishScheduler::new(
        universe.clone(),
        price_cache.clone(),
        Arc::new(publisher),
        config.tick_interval,
        config.batch_size,
    ));

    let analytics = AnalyticsEngine::new(store.clone(), price_cache.clone());

    let mut scheduler = JobSchedulerService::new(
        JobContext {
            universe: universe.clone(),
            publish_scheduler,
        },
        JobSchedule {
            tick_interval: config.tick_interval,
            universe_refresh_interval: config.universe_refresh_interval,
        },
    )
    .await?;
    scheduler.start().await?;

    let state = AppState {
        store,
        analytics,
        price_cache,
        universe,
    };
    let app = app::create_app(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("🚀 tickerflow running at http://{}/", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = scheduler.stop().await {
        error!("Failed to stop job scheduler: {}", e);
    }
    drop(scheduler);
    match tokio::time::timeout(Duration::from_secs(2), consumer).await {
        Ok(Ok(stored)) => info!("Consumer drained, {} snapshots stored this run", stored),
        Ok(Err(e)) => error!("Consumer task failed: {}", e),
        Err(_) => warn!("Consumer still running at shutdown, abandoning it"),
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
    }
    info!("🛑 Shutdown signal received");
}
