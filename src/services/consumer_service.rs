use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::models::PriceSnapshot;
use crate::services::historical_service;
use crate::services::publisher::Envelope;
use crate::store::HistoricalStore;

#[derive(Debug, Error)]
pub enum ConsumeError {
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid snapshot: {0}")]
    Invalid(String),

    #[error("store error: {0}")]
    Store(#[from] AppError),
}

/// Decodes one envelope and appends it to the historical store.
pub async fn handle_message(
    store: &dyn HistoricalStore,
    envelope: &Envelope,
) -> Result<PriceSnapshot, ConsumeError> {
    let snapshot: PriceSnapshot = serde_json::from_str(&envelope.payload)?;

    if snapshot.symbol.is_empty() {
        return Err(ConsumeError::Invalid("empty symbol".into()));
    }
    if !snapshot.price.is_finite() || snapshot.price <= 0.0 {
        return Err(ConsumeError::Invalid(format!(
            "price {} for {}",
            snapshot.price, snapshot.symbol
        )));
    }

    historical_service::save_stock_price(
        store,
        &snapshot.symbol,
        snapshot.price,
        snapshot.volume,
        snapshot.timestamp,
    )
    .await?;

    Ok(snapshot)
}

/// Drains the topic into the store until the channel closes. Returns the number of
/// snapshots stored.
pub async fn run(
    mut receiver: broadcast::Receiver<Envelope>,
    store: Arc<dyn HistoricalStore>,
) -> usize {
    let mut stored = 0;

    loop {
        match receiver.recv().await {
            Ok(envelope) => match handle_message(store.as_ref(), &envelope).await {
                Ok(snapshot) => {
                    stored += 1;
                    debug!("Stored {} @ {}", snapshot.symbol, snapshot.price);
                }
                Err(e) => warn!("Dropping message for {}: {}", envelope.key, e),
            },
            Err(RecvError::Lagged(skipped)) => {
                warn!("⚠️  Price consumer lagged, {} messages skipped", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }

    info!("Price consumer stopped after storing {} snapshots", stored);
    stored
}

pub fn spawn(
    receiver: broadcast::Receiver<Envelope>,
    store: Arc<dyn HistoricalStore>,
) -> JoinHandle<usize> {
    tokio::spawn(run(receiver, store))
}
