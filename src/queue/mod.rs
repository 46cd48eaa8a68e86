//! Work queue seam
//!
//! The durable transport is an external collaborator; the core only depends
//! on receive/delete/visibility-timeout semantics. A received message stays
//! invisible to other receivers until its visibility timeout, and an
//! unacknowledged (undeleted) message becomes visible again afterwards —
//! redelivery is the system's retry mechanism.

pub mod memory;

pub use memory::InMemoryQueue;

use std::time::Duration;

use async_trait::async_trait;

/// A message as delivered to a consumer
#[derive(Debug, Clone)]
pub struct QueueMessage {
    /// Stable message id
    pub id: String,
    /// Acknowledgment handle for this delivery; goes stale on redelivery
    pub receipt_handle: String,
    /// Raw payload body
    pub body: String,
}

/// Parameters for a receive call
#[derive(Debug, Clone)]
pub struct ReceiveOptions {
    /// Maximum messages returned per call
    pub max_messages: usize,
    /// Long-poll wait for the first available message
    pub wait_time: Duration,
    /// How long delivered messages stay invisible before redelivery
    pub visibility_timeout: Duration,
}

impl Default for ReceiveOptions {
    fn default() -> Self {
        Self {
            max_messages: 10,
            wait_time: Duration::from_secs(10),
            visibility_timeout: Duration::from_secs(30),
        }
    }
}

/// Queue transport operations the consumer depends on
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Receive up to `max_messages`, waiting up to `wait_time` for the first.
    /// Returns an empty batch when the wait elapses with nothing available.
    async fn receive(&self, opts: &ReceiveOptions) -> Result<Vec<QueueMessage>, QueueError>;

    /// Acknowledge a delivery; the message will not be redelivered
    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError>;

    /// Enqueue a new message body, returning its id
    async fn send(&self, body: String) -> Result<String, QueueError>;
}

/// Queue transport errors
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unknown or stale receipt handle: {0}")]
    UnknownReceipt(String),
}
