//! Document store seam
//!
//! Measurements and alerts live in an external document store; the engine
//! depends only on these traits. [`MemoryStore`] is the in-process
//! implementation backing the binary and the tests.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::data::{Alert, AlertType, Measurement};

/// Append-only measurement collection
#[async_trait]
pub trait MeasurementStore: Send + Sync {
    /// Insert a measurement record
    async fn insert(&self, measurement: &Measurement) -> Result<(), StoreError>;

    /// All measurements for a plot with `from <= timestamp <= to`,
    /// ordered ascending by observation timestamp
    async fn for_plot_in_window(
        &self,
        plot_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Measurement>, StoreError>;
}

/// Alert collection
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Insert an alert record
    async fn insert(&self, alert: &Alert) -> Result<(), StoreError>;

    /// The active alert of a given type for a plot, if any
    async fn find_active(
        &self,
        plot_id: &str,
        alert_type: AlertType,
    ) -> Result<Option<Alert>, StoreError>;

    /// Count of active alerts across all plots and types
    async fn count_active(&self) -> Result<u64, StoreError>;
}

/// Document store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Write failed: {0}")]
    Write(String),

    #[error("Query failed: {0}")]
    Query(String),
}
