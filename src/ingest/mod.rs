//! Queue ingestion
//!
//! The consumer drains the work queue and delegates each decoded measurement
//! to the alert engine, deleting a message only after it processed
//! successfully. Anything else is left for redelivery.

pub mod consumer;

pub use consumer::{ConsumerConfig, ProcessError, QueueConsumer};
