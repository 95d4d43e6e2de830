//! Domain event producer. Events are logged, not sent to a broker.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

use crate::config::MessagingConfig;
use crate::domain::DomainError;

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Broker unavailable: {0}")]
    Unavailable(String),
}

impl From<PublishError> for DomainError {
    fn from(err: PublishError) -> Self {
        DomainError::Publish(err.to_string())
    }
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: Value) -> Result<(), PublishError>;
}

/// Writes each event to the log with the configured broker settings
#[derive(Debug, Clone)]
pub struct LogEventPublisher {
    brokers: Vec<String>,
    client_id: String,
}

impl LogEventPublisher {
    pub fn from_config(config: &MessagingConfig) -> Self {
        Self {
            brokers: config.brokers.clone(),
            client_id: config.client_id.clone(),
        }
    }
}

#[async_trait]
impl EventPublisher for LogEventPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: Value) -> Result<(), PublishError> {
        if self.brokers.is_empty() {
            return Err(PublishError::Unavailable("no brokers configured".to_string()));
        }

        tracing::info!(
            topic,
            key,
            client_id = %self.client_id,
            brokers = ?self.brokers,
            payload = %payload,
            "Event published"
        );
        Ok(())
    }
}

/// A published event as captured by `MemoryEventPublisher`
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedEvent {
    pub topic: String,
    pub key: String,
    pub payload: Value,
}

/// Keeps events in memory; can be switched to fail every publish
#[derive(Debug, Default)]
pub struct MemoryEventPublisher {
    events: Mutex<Vec<PublishedEvent>>,
    failing: bool,
}

impl MemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn events(&self) -> Vec<PublishedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn topics(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.topic).collect()
    }
}

#[async_trait]
impl EventPublisher for MemoryEventPublisher {
    async fn publish(&self, topic: &str, key: &str, payload: Value) -> Result<(), PublishError> {
        if self.failing {
            return Err(PublishError::Unavailable("publisher disabled".to_string()));
        }

        if let Ok(mut events) = self.events.lock() {
            events.push(PublishedEvent {
                topic: topic.to_string(),
                key: key.to_string(),
                payload,
            });
        }
        Ok(())
    }
}
