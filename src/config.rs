use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::errors::AppError;

/// Runtime settings, read from the environment (optionally seeded by a `.env` file).
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres connection string. Without it the service keeps history in memory.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub bind_addr: String,
    pub alphavantage_api_key: String,
    pub publish_topic: String,
    pub channel_capacity: usize,
    pub tick_interval: Duration,
    pub batch_size: usize,
    pub universe_refresh_interval: Duration,
    pub rate_limit: Duration,
    pub upstream_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            database_url: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10),
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            alphavantage_api_key: lookup("ALPHAVANTAGE_API_KEY")
                .unwrap_or_else(|| "demo".to_string()),
            publish_topic: lookup("PUBLISH_TOPIC").unwrap_or_else(|| "stock-prices".to_string()),
            channel_capacity: parse_or(&lookup, "CHANNEL_CAPACITY", 1024),
            tick_interval: Duration::from_secs(parse_or(&lookup, "TICK_INTERVAL_SECS", 10)),
            batch_size: parse_or(&lookup, "BATCH_SIZE", 5),
            universe_refresh_interval: Duration::from_secs(parse_or(
                &lookup,
                "UNIVERSE_REFRESH_SECS",
                60,
            )),
            rate_limit: Duration::from_secs(parse_or(&lookup, "RATE_LIMIT_SECS", 5)),
            upstream_timeout: Duration::from_secs(parse_or(&lookup, "UPSTREAM_TIMEOUT_SECS", 5)),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.tick_interval.is_zero() {
            return Err(AppError::Validation("TICK_INTERVAL_SECS must be positive".into()));
        }
        if self.universe_refresh_interval.is_zero() {
            return Err(AppError::Validation("UNIVERSE_REFRESH_SECS must be positive".into()));
        }
        if self.batch_size == 0 {
            return Err(AppError::Validation("BATCH_SIZE must be positive".into()));
        }
        if self.channel_capacity == 0 {
            return Err(AppError::Validation("CHANNEL_CAPACITY must be positive".into()));
        }
        if self.upstream_timeout.is_zero() {
            return Err(AppError::Validation("UPSTREAM_TIMEOUT_SECS must be positive".into()));
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid value '{}' for {}, using default {}", raw, key, default);
            default
        }),
        None => default,
    }
}
