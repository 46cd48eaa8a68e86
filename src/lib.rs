//! Plotwatch: queue-driven sensor ingestion and drought alerting
//!
//! Consumes time-series sensor readings from a durable work queue, persists
//! them, and evaluates a sliding-window drought rule per monitored plot,
//! raising deduplicated alerts.
//!
//! # Features
//!
//! - **At-least-once ingestion**: messages are deleted only after successful
//!   processing; failures are redelivered after the visibility timeout
//! - **Windowed drought rule**: every reading over the trailing window below
//!   the humidity threshold, with the window covered back to its start
//! - **Alert dedup**: at most one active alert per (plot, type), serialized
//!   per plot
//! - **Prometheus metrics**: pull-based `/metrics` endpoint
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use plotwatch::{AlertEngine, AppMetrics, DroughtRule, Measurement, MemoryStore};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = Arc::new(MemoryStore::new());
//! let metrics = Arc::new(AppMetrics::new().unwrap());
//! let engine = AlertEngine::new(
//!     store.clone(),
//!     store.clone(),
//!     metrics,
//!     DroughtRule::default(),
//! );
//!
//! let reading = Measurement::new("plot-1", 35.0, 22.0, 0.0, chrono::Utc::now());
//! engine.process(&reading).await.unwrap();
//! # }
//! ```

pub mod alerts;
pub mod api;
pub mod config;
pub mod data;
pub mod ingest;
pub mod metrics;
pub mod queue;
pub mod storage;

// Re-export commonly used types
pub use alerts::{AlertEngine, DroughtRule, EngineError};
pub use config::AppConfig;
pub use data::{Alert, AlertType, Measurement, MeasurementPayload};
pub use ingest::{ConsumerConfig, QueueConsumer};
pub use metrics::AppMetrics;
pub use queue::{InMemoryQueue, QueueError, QueueMessage, ReceiveOptions, WorkQueue};
pub use storage::{AlertStore, MeasurementStore, MemoryStore, StoreError};
