//! Queue consumer
//!
//! Long-polls the work queue in batches and hands each decoded payload to
//! the alert engine. A message is deleted only after the engine succeeds;
//! decode, validation and store failures leave it undeleted so the queue
//! redelivers it after the visibility timeout. Transport failures back off
//! and retry and are never fatal.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use crate::alerts::{AlertEngine, EngineError};
use crate::data::MeasurementPayload;
use crate::metrics::AppMetrics;
use crate::queue::{QueueMessage, ReceiveOptions, WorkQueue};

/// Consumer tuning
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Maximum messages per receive call
    pub max_messages: usize,
    /// Long-poll wait per receive call
    pub wait_time: Duration,
    /// How long a received message stays invisible before redelivery
    pub visibility_timeout: Duration,
    /// Pause after a transport-level receive failure
    pub error_backoff: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            max_messages: 10,
            wait_time: Duration::from_secs(10),
            visibility_timeout: Duration::from_secs(30),
            error_backoff: Duration::from_secs(2),
        }
    }
}

/// Per-message failures. Every variant maps to "log, count once, leave the
/// message undeleted".
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Invalid JSON body: {0}")]
    Decode(String),

    #[error("Invalid measurement: {0}")]
    Invalid(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Failed to delete message: {0}")]
    Acknowledge(String),
}

/// Drains the work queue and delegates to the alert engine
pub struct QueueConsumer {
    queue: Arc<dyn WorkQueue>,
    engine: Arc<AlertEngine>,
    metrics: Arc<AppMetrics>,
    config: ConsumerConfig,
    shutdown_tx: Option<mpsc::Sender<()>>,
}

impl QueueConsumer {
    pub fn new(
        queue: Arc<dyn WorkQueue>,
        engine: Arc<AlertEngine>,
        metrics: Arc<AppMetrics>,
        config: ConsumerConfig,
    ) -> Self {
        Self {
            queue,
            engine,
            metrics,
            config,
            shutdown_tx: None,
        }
    }

    /// Start consuming in the background
    pub fn start(&mut self) -> tokio::task::JoinHandle<()> {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        self.shutdown_tx = Some(shutdown_tx);

        let queue = Arc::clone(&self.queue);
        let engine = Arc::clone(&self.engine);
        let metrics = Arc::clone(&self.metrics);
        let config = self.config.clone();

        tokio::spawn(async move {
            tracing::info!("Queue consumer started");

            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        tracing::info!("Queue consumer shutting down");
                        break;
                    }
                    _ = Self::poll_once(queue.as_ref(), &engine, &metrics, &config) => {}
                }
            }
        })
    }

    /// Stop the consumer. An in-flight long poll or batch is aborted.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
    }

    /// One receive-and-process round. Transport failures back off here and
    /// never escape; per-message failures are isolated inside the batch loop.
    async fn poll_once(
        queue: &dyn WorkQueue,
        engine: &AlertEngine,
        metrics: &AppMetrics,
        config: &ConsumerConfig,
    ) {
        let opts = ReceiveOptions {
            max_messages: config.max_messages,
            wait_time: config.wait_time,
            visibility_timeout: config.visibility_timeout,
        };

        let batch = match queue.receive(&opts).await {
            Ok(batch) => batch,
            Err(e) => {
                metrics.processing_errors.inc();
                tracing::error!(error = %e, "Error receiving messages");
                tokio::time::sleep(config.error_backoff).await;
                return;
            }
        };

        for message in batch {
            let started = Instant::now();
            let outcome = Self::handle_message(queue, engine, &message).await;
            metrics
                .processing_duration_ms
                .observe(started.elapsed().as_secs_f64() * 1000.0);

            if let Err(e) = outcome {
                metrics.processing_errors.inc();
                tracing::error!(
                    message_id = %message.id,
                    error = %e,
                    "Failed to process message; leaving it for redelivery"
                );
            }
        }
    }

    /// Decode, validate, process and acknowledge a single message
    async fn handle_message(
        queue: &dyn WorkQueue,
        engine: &AlertEngine,
        message: &QueueMessage,
    ) -> Result<(), ProcessError> {
        let payload: MeasurementPayload = serde_json::from_str(&message.body)
            .map_err(|e| ProcessError::Decode(e.to_string()))?;

        if payload.plot_id.trim().is_empty() {
            return Err(ProcessError::Invalid("plot id is required".to_string()));
        }

        let measurement = payload.into_measurement();
        engine.process(&measurement).await?;

        queue
            .delete(&message.receipt_handle)
            .await
            .map_err(|e| ProcessError::Acknowledge(e.to_string()))?;

        tracing::info!(
            message_id = %message.id,
            plot_id = %measurement.plot_id,
            "Message processed and deleted"
        );
        Ok(())
    }
}
