use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

/// One message on the publish channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub topic: String,
    pub key: String,
    pub payload: String,
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("no subscribers on topic {0}")]
    NoSubscribers(String),
}

/// Downstream channel for price snapshots, keyed by symbol.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, key: &str, payload: String) -> Result<(), PublishError>;
}

/// In-process topic backed by a tokio broadcast channel.
#[derive(Clone)]
pub struct BroadcastPublisher {
    topic: String,
    sender: broadcast::Sender<Envelope>,
}

impl BroadcastPublisher {
    pub fn new(topic: &str, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            topic: topic.chars().filter(|c| !c.is_whitespace()).collect(),
            sender,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl Publisher for BroadcastPublisher {
    async fn publish(&self, key: &str, payload: String) -> Result<(), PublishError> {
        let envelope = Envelope {
            topic: self.topic.clone(),
            key: key.to_string(),
            payload,
        };

        let receivers = self
            .sender
            .send(envelope)
            .map_err(|_| PublishError::NoSubscribers(self.topic.clone()))?;
        debug!("Published {} to {} ({} receivers)", key, self.topic, receivers);
        Ok(())
    }
}
