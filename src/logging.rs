use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub loki_enabled: bool,
    pub loki_url: Option<String>,
    pub service_name: String,
    pub environment: String,
    pub log_level: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests don't have to touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            loki_enabled: lookup("LOKI_ENABLED")
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            loki_url: lookup("LOKI_URL"),
            service_name: lookup("SERVICE_NAME").unwrap_or_else(|| "tickerflow".to_string()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.loki_enabled && self.loki_url.is_none() {
            return Err("LOKI_ENABLED is true but LOKI_URL is not set".to_string());
        }
        Ok(())
    }
}

pub fn init_logging(config: LoggingConfig) -> anyhow::Result<()> {
    config.validate().map_err(anyhow::Error::msg)?;

    #[cfg(feature = "loki")]
    {
        if config.loki_enabled {
            if let Some(loki_url) = config.loki_url.clone() {
                return init_with_loki(config, &loki_url);
            }
        }
    }

    init_console_only(config)
}

fn init_console_only(config: LoggingConfig) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    tracing::info!("📊 Console logging initialized (level: {})", config.log_level);
    Ok(())
}

#[cfg(feature = "loki")]
fn init_with_loki(config: LoggingConfig, loki_url: &str) -> anyhow::Result<()> {
    let url = url::Url::parse(loki_url)?;

    let (loki_layer, task) = tracing_loki::builder()
        .label("service", &config.service_name)?
        .label("environment", &config.environment)?
        .build_url(url)?;

    // Ships buffered log lines to Loki in the background.
    tokio::spawn(task);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .with(loki_layer)
        .try_init()?;

    tracing::info!("✅ Loki logging initialized at {}", loki_url);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_without_env() {
        let config = LoggingConfig::from_lookup(|_| None);
        assert!(!config.loki_enabled);
        assert_eq!(config.service_name, "tickerflow");
        assert_eq!(config.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_loki_without_url_is_rejected() {
        let env: HashMap<&str, &str> = HashMap::from([("LOKI_ENABLED", "true")]);
        let config = LoggingConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert!(config.loki_enabled);
        assert!(config.validate().is_err());
    }
}
