//! Drought alert engine
//!
//! Persists measurements and evaluates the sliding-window drought rule: a
//! plot gets an active DROUGHT alert when every reading over the trailing
//! window is below the humidity threshold and the readings actually reach
//! back to the window start. At most one active alert exists per
//! (plot, type); the check-then-insert is serialized per plot.

use std::sync::Arc;

use chrono::{Duration, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::data::{Alert, AlertType, Measurement};
use crate::metrics::AppMetrics;
use crate::storage::{AlertStore, MeasurementStore, StoreError};

/// Slack allowed between the window start and the earliest reading for the
/// window to count as covered. The window fetch extends this far before the
/// start so a reading just ahead of the boundary satisfies the check.
const COVERAGE_TOLERANCE_MINUTES: i64 = 5;

/// Drought rule parameters, read once at construction
#[derive(Debug, Clone)]
pub struct DroughtRule {
    /// Readings at or above this humidity defeat the alert
    pub humidity_threshold: f64,
    /// Trailing window length in hours
    pub window_hours: i64,
}

impl Default for DroughtRule {
    fn default() -> Self {
        Self {
            humidity_threshold: 40.0,
            window_hours: 24,
        }
    }
}

/// Engine errors. Store failures propagate unchanged; queue redelivery is
/// the retry mechanism.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid measurement: {0}")]
    InvalidMeasurement(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Persists measurements and raises deduplicated drought alerts
pub struct AlertEngine {
    measurements: Arc<dyn MeasurementStore>,
    alerts: Arc<dyn AlertStore>,
    metrics: Arc<AppMetrics>,
    rule: DroughtRule,
    /// Serializes check-then-insert per plot so concurrent messages for the
    /// same plot cannot both create an active alert
    plot_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl AlertEngine {
    pub fn new(
        measurements: Arc<dyn MeasurementStore>,
        alerts: Arc<dyn AlertStore>,
        metrics: Arc<AppMetrics>,
        rule: DroughtRule,
    ) -> Self {
        Self {
            measurements,
            alerts,
            metrics,
            rule,
            plot_locks: DashMap::new(),
        }
    }

    /// Persist a measurement and evaluate the drought rule for its plot
    pub async fn process(&self, measurement: &Measurement) -> Result<(), EngineError> {
        if measurement.plot_id.trim().is_empty() {
            return Err(EngineError::InvalidMeasurement(
                "plot id is required".to_string(),
            ));
        }

        self.measurements.insert(measurement).await?;
        self.metrics.measurements_saved.inc();

        tracing::info!(
            plot_id = %measurement.plot_id,
            humidity = measurement.humidity,
            timestamp = %measurement.timestamp,
            "Saved measurement"
        );

        self.try_create_drought_alert(&measurement.plot_id).await?;

        let active = self.alerts.count_active().await?;
        self.metrics.alerts_active.set(active as f64);

        Ok(())
    }

    /// Create a drought alert for the plot unless one is already active or
    /// the window evidence does not support it.
    async fn try_create_drought_alert(&self, plot_id: &str) -> Result<(), EngineError> {
        let lock = self.plot_lock(plot_id);
        let _guard = lock.lock().await;

        if self
            .alerts
            .find_active(plot_id, AlertType::Drought)
            .await?
            .is_some()
        {
            return Ok(());
        }

        let now = Utc::now();
        let from = now - Duration::hours(self.rule.window_hours);
        let tolerance = Duration::minutes(COVERAGE_TOLERANCE_MINUTES);

        // The fetch includes the tolerance margin before the window start so
        // a reading just ahead of the boundary can prove coverage.
        let window = self
            .measurements
            .for_plot_in_window(plot_id, from - tolerance, now)
            .await?;

        let (oldest, newest) = match (window.first(), window.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Ok(()),
        };

        // Nothing inside the window proper: no evidence either way
        if newest.timestamp < from {
            return Ok(());
        }

        // Covered for the full period only if readings reach back to the start
        if oldest.timestamp > from + tolerance {
            return Ok(());
        }

        let all_below = window
            .iter()
            .all(|m| m.humidity < self.rule.humidity_threshold);
        if !all_below {
            return Ok(());
        }

        let alert = Alert::drought(plot_id, self.rule.humidity_threshold, self.rule.window_hours);
        self.alerts.insert(&alert).await?;
        self.metrics.alerts_created.inc();

        tracing::warn!(
            plot_id = %plot_id,
            alert_id = %alert.id,
            "DROUGHT alert triggered"
        );

        Ok(())
    }

    fn plot_lock(&self, plot_id: &str) -> Arc<Mutex<()>> {
        let entry = self.plot_locks.entry(plot_id.to_string()).or_default();
        Arc::clone(&entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    fn test_engine(rule: DroughtRule) -> (AlertEngine, Arc<MemoryStore>, Arc<AppMetrics>) {
        let store = Arc::new(MemoryStore::new());
        let metrics = Arc::new(AppMetrics::new().unwrap());
        let engine = AlertEngine::new(
            store.clone(),
            store.clone(),
            metrics.clone(),
            rule,
        );
        (engine, store, metrics)
    }

    fn reading(plot: &str, humidity: f64, minutes_ago: i64) -> Measurement {
        Measurement::new(
            plot,
            humidity,
            22.0,
            0.0,
            Utc::now() - Duration::minutes(minutes_ago),
        )
    }

    /// Hourly readings covering the full 24h window, first one two minutes
    /// before the window start.
    async fn seed_covered_window(store: &MemoryStore, plot: &str, humidity: f64) {
        for h in 0..=24 {
            MeasurementStore::insert(store, &reading(plot, humidity, h * 60 + 2))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_process_saves_measurement() {
        let (engine, store, metrics) = test_engine(DroughtRule::default());

        engine
            .process(&reading("p1", 55.0, 0))
            .await
            .unwrap();

        assert_eq!(store.measurement_count(), 1);
        assert_eq!(metrics.measurements_saved.get(), 1.0);
    }

    #[tokio::test]
    async fn test_blank_plot_id_rejected() {
        let (engine, store, _metrics) = test_engine(DroughtRule::default());

        let result = engine.process(&reading("  ", 55.0, 0)).await;

        assert!(matches!(result, Err(EngineError::InvalidMeasurement(_))));
        assert_eq!(store.measurement_count(), 0);
    }

    #[tokio::test]
    async fn test_covered_low_humidity_window_triggers_alert() {
        let (engine, store, metrics) = test_engine(DroughtRule::default());
        seed_covered_window(&store, "p1", 35.0).await;

        engine.process(&reading("p1", 35.0, 0)).await.unwrap();

        let alerts = store.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::Drought);
        assert!(alerts[0].active);
        assert!(alerts[0].message.contains("40"));
        assert!(alerts[0].message.contains("24h"));
        assert_eq!(metrics.alerts_created.get(), 1.0);
        assert_eq!(metrics.alerts_active.get(), 1.0);
    }

    #[tokio::test]
    async fn test_active_alert_deduplicates() {
        let (engine, store, metrics) = test_engine(DroughtRule::default());
        seed_covered_window(&store, "p1", 35.0).await;

        engine.process(&reading("p1", 35.0, 0)).await.unwrap();
        engine.process(&reading("p1", 34.0, 0)).await.unwrap();

        assert_eq!(store.alerts().len(), 1);
        assert_eq!(metrics.alerts_created.get(), 1.0);
    }

    #[tokio::test]
    async fn test_single_high_reading_defeats_alert() {
        let (engine, store, _metrics) = test_engine(DroughtRule::default());
        seed_covered_window(&store, "p1", 35.0).await;

        // One wet reading in the middle of an otherwise dry window
        MeasurementStore::insert(&*store, &reading("p1", 80.0, 5 * 60))
            .await
            .unwrap();

        engine.process(&reading("p1", 35.0, 0)).await.unwrap();

        assert!(store.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_reading_at_threshold_defeats_alert() {
        let (engine, store, _metrics) = test_engine(DroughtRule::default());
        seed_covered_window(&store, "p1", 35.0).await;

        // Strictly-below rule: a reading exactly at the threshold counts wet
        MeasurementStore::insert(&*store, &reading("p1", 40.0, 5 * 60))
            .await
            .unwrap();

        engine.process(&reading("p1", 35.0, 0)).await.unwrap();

        assert!(store.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_uncovered_window_defeats_alert() {
        let (engine, store, _metrics) = test_engine(DroughtRule::default());

        // Oldest reading is an hour into the window: not covered
        for h in 0..23 {
            MeasurementStore::insert(&*store, &reading("p1", 35.0, h * 60 + 2))
                .await
                .unwrap();
        }

        engine.process(&reading("p1", 35.0, 0)).await.unwrap();

        assert!(store.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_empty_window_never_alerts() {
        let (engine, store, _metrics) = test_engine(DroughtRule::default());

        engine.try_create_drought_alert("p1").await.unwrap();

        assert!(store.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_margin_only_reading_never_alerts() {
        let (engine, store, _metrics) = test_engine(DroughtRule::default());

        // A single reading just before the window start proves nothing about
        // the window itself
        MeasurementStore::insert(&*store, &reading("p1", 35.0, 24 * 60 + 1))
            .await
            .unwrap();

        engine.try_create_drought_alert("p1").await.unwrap();

        assert!(store.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_same_plot_creates_single_alert() {
        let (engine, store, _metrics) = test_engine(DroughtRule::default());
        seed_covered_window(&store, "p1", 35.0).await;

        let engine = Arc::new(engine);
        let a = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.process(&reading("p1", 35.0, 0)).await })
        };
        let b = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.process(&reading("p1", 34.0, 0)).await })
        };

        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        assert_eq!(store.alerts().len(), 1);
    }

    #[tokio::test]
    async fn test_alerts_are_per_plot() {
        let (engine, store, _metrics) = test_engine(DroughtRule::default());
        seed_covered_window(&store, "p1", 35.0).await;
        seed_covered_window(&store, "p2", 35.0).await;

        engine.process(&reading("p1", 35.0, 0)).await.unwrap();
        engine.process(&reading("p2", 35.0, 0)).await.unwrap();

        assert_eq!(store.alerts().len(), 2);
    }

    #[tokio::test]
    async fn test_gauge_tracks_active_alerts() {
        let (engine, store, metrics) = test_engine(DroughtRule::default());
        seed_covered_window(&store, "p1", 35.0).await;

        engine.process(&reading("p1", 35.0, 0)).await.unwrap();
        assert_eq!(metrics.alerts_active.get(), 1.0);

        // A wet plot leaves the gauge unchanged
        engine.process(&reading("p2", 90.0, 0)).await.unwrap();
        assert_eq!(metrics.alerts_active.get(), 1.0);
    }

    struct FailingStore;

    #[async_trait]
    impl MeasurementStore for FailingStore {
        async fn insert(&self, _measurement: &Measurement) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn for_plot_in_window(
            &self,
            _plot_id: &str,
            _from: DateTime<Utc>,
            _to: DateTime<Utc>,
        ) -> Result<Vec<Measurement>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_store_failure_propagates_without_error_count() {
        let store = Arc::new(MemoryStore::new());
        let metrics = Arc::new(AppMetrics::new().unwrap());
        let engine = AlertEngine::new(
            Arc::new(FailingStore),
            store.clone(),
            metrics.clone(),
            DroughtRule::default(),
        );

        let result = engine.process(&reading("p1", 35.0, 0)).await;

        assert!(matches!(result, Err(EngineError::Store(_))));
        assert!(store.alerts().is_empty());
        // Error accounting happens once, at the consumer boundary
        assert_eq!(metrics.processing_errors.get(), 0.0);
        assert_eq!(metrics.measurements_saved.get(), 0.0);
    }
}
