//! In-process work queue with visibility-timeout redelivery
//!
//! Backs the binary and the tests with real durable-queue semantics:
//! delivered messages stay invisible until their visibility deadline, and an
//! unacknowledged message is redelivered with a fresh receipt handle, which
//! invalidates the previous one.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::Notify;
use uuid::Uuid;

use super::{QueueError, QueueMessage, ReceiveOptions, WorkQueue};
use async_trait::async_trait;

/// How often a long poll re-checks for newly visible messages. Sends wake
/// waiters immediately; this bounds the wait on visibility expiry.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

struct StoredMessage {
    id: String,
    body: String,
    /// Receipt handle of the latest delivery
    receipt_handle: Option<String>,
    /// Hidden from receive calls until this deadline
    invisible_until: Option<Instant>,
    receive_count: u32,
}

/// In-memory work queue
pub struct InMemoryQueue {
    url: String,
    messages: Mutex<Vec<StoredMessage>>,
    notify: Notify,
}

impl InMemoryQueue {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            messages: Mutex::new(Vec::new()),
            notify: Notify::new(),
        }
    }

    /// Configured endpoint, for logs
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Messages currently held, visible or in flight
    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }

    /// Claim up to `max_messages` visible messages, marking each invisible
    /// for the visibility timeout and rotating its receipt handle.
    fn take_visible(&self, opts: &ReceiveOptions) -> Vec<QueueMessage> {
        let now = Instant::now();
        let mut messages = self.messages.lock();
        let mut batch = Vec::new();

        for msg in messages.iter_mut() {
            if batch.len() >= opts.max_messages {
                break;
            }
            let visible = msg.invisible_until.map_or(true, |t| t <= now);
            if !visible {
                continue;
            }

            let receipt = Uuid::new_v4().to_string();
            msg.receipt_handle = Some(receipt.clone());
            msg.invisible_until = Some(now + opts.visibility_timeout);
            msg.receive_count += 1;

            batch.push(QueueMessage {
                id: msg.id.clone(),
                receipt_handle: receipt,
                body: msg.body.clone(),
            });
        }

        batch
    }
}

#[async_trait]
impl WorkQueue for InMemoryQueue {
    async fn receive(&self, opts: &ReceiveOptions) -> Result<Vec<QueueMessage>, QueueError> {
        let deadline = Instant::now() + opts.wait_time;

        loop {
            let batch = self.take_visible(opts);
            if !batch.is_empty() {
                return Ok(batch);
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(Vec::new());
            }

            let wait = (deadline - now).min(POLL_INTERVAL);
            let _ = tokio::time::timeout(wait, self.notify.notified()).await;
        }
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError> {
        let mut messages = self.messages.lock();
        let before = messages.len();
        messages.retain(|m| m.receipt_handle.as_deref() != Some(receipt_handle));

        if messages.len() == before {
            return Err(QueueError::UnknownReceipt(receipt_handle.to_string()));
        }
        Ok(())
    }

    async fn send(&self, body: String) -> Result<String, QueueError> {
        let id = Uuid::new_v4().to_string();
        self.messages.lock().push(StoredMessage {
            id: id.clone(),
            body,
            receipt_handle: None,
            invisible_until: None,
            receive_count: 0,
        });
        self.notify.notify_waiters();
        Ok(id)
    }
}
