//! In-memory document store

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{AlertStore, MeasurementStore, StoreError};
use crate::data::{Alert, AlertType, Measurement};
use async_trait::async_trait;

/// In-memory store implementing both collections
#[derive(Default)]
pub struct MemoryStore {
    measurements: RwLock<Vec<Measurement>>,
    alerts: RwLock<Vec<Alert>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored measurements
    pub fn measurement_count(&self) -> usize {
        self.measurements.read().len()
    }

    /// Snapshot of every stored alert
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.read().clone()
    }
}

#[async_trait]
impl MeasurementStore for MemoryStore {
    async fn insert(&self, measurement: &Measurement) -> Result<(), StoreError> {
        self.measurements.write().push(measurement.clone());
        Ok(())
    }

    async fn for_plot_in_window(
        &self,
        plot_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Measurement>, StoreError> {
        let mut rows: Vec<Measurement> = self
            .measurements
            .read()
            .iter()
            .filter(|m| m.plot_id == plot_id && m.timestamp >= from && m.timestamp <= to)
            .cloned()
            .collect();

        rows.sort_by_key(|m| m.timestamp);
        Ok(rows)
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn insert(&self, alert: &Alert) -> Result<(), StoreError> {
        self.alerts.write().push(alert.clone());
        Ok(())
    }

    async fn find_active(
        &self,
        plot_id: &str,
        alert_type: AlertType,
    ) -> Result<Option<Alert>, StoreError> {
        let found = self
            .alerts
            .read()
            .iter()
            .find(|a| a.plot_id == plot_id && a.alert_type == alert_type && a.active)
            .cloned();
        Ok(found)
    }

    async fn count_active(&self) -> Result<u64, StoreError> {
        Ok(self.alerts.read().iter().filter(|a| a.active).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn reading(plot: &str, minutes_ago: i64) -> Measurement {
        Measurement::new(plot, 35.0, 22.0, 0.0, Utc::now() - Duration::minutes(minutes_ago))
    }

    #[tokio::test]
    async fn test_window_query_filters_and_sorts() {
        let store = MemoryStore::new();
        let now = Utc::now();

        // Insert out of order, across two plots
        MeasurementStore::insert(&store, &reading("p1", 10)).await.unwrap();
        MeasurementStore::insert(&store, &reading("p1", 120)).await.unwrap();
        MeasurementStore::insert(&store, &reading("p1", 60)).await.unwrap();
        MeasurementStore::insert(&store, &reading("p2", 30)).await.unwrap();

        let rows = store
            .for_plot_in_window("p1", now - Duration::minutes(90), now)
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert!(rows[0].timestamp <= rows[1].timestamp);
        assert!(rows.iter().all(|m| m.plot_id == "p1"));
    }

    #[tokio::test]
    async fn test_window_bounds_are_inclusive() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let from = now - Duration::hours(1);

        let at_start = Measurement::new("p1", 35.0, 22.0, 0.0, from);
        let at_end = Measurement::new("p1", 35.0, 22.0, 0.0, now);
        MeasurementStore::insert(&store, &at_start).await.unwrap();
        MeasurementStore::insert(&store, &at_end).await.unwrap();

        let rows = store.for_plot_in_window("p1", from, now).await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_find_active_ignores_inactive() {
        let store = MemoryStore::new();

        let mut resolved = Alert::drought("p1", 40.0, 24);
        resolved.active = false;
        AlertStore::insert(&store, &resolved).await.unwrap();

        assert!(store
            .find_active("p1", AlertType::Drought)
            .await
            .unwrap()
            .is_none());

        AlertStore::insert(&store, &Alert::drought("p1", 40.0, 24)).await.unwrap();
        let found = store.find_active("p1", AlertType::Drought).await.unwrap();
        assert!(found.is_some());
        assert!(found.unwrap().active);
    }

    #[tokio::test]
    async fn test_count_active() {
        let store = MemoryStore::new();

        AlertStore::insert(&store, &Alert::drought("p1", 40.0, 24)).await.unwrap();
        AlertStore::insert(&store, &Alert::drought("p2", 40.0, 24)).await.unwrap();

        let mut resolved = Alert::drought("p3", 40.0, 24);
        resolved.active = false;
        AlertStore::insert(&store, &resolved).await.unwrap();

        assert_eq!(store.count_active().await.unwrap(), 2);
    }
}
