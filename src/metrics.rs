//! Prometheus metrics
//!
//! A constructed registry handle rather than process-global statics. The
//! consumer and engine hold an `Arc<AppMetrics>`; the api module renders the
//! registry at `GET /metrics`. The metric names are an external contract.

use prometheus::{Counter, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder};

/// Application metrics handle
pub struct AppMetrics {
    registry: Registry,
    /// Measurements persisted to the store
    pub measurements_saved: Counter,
    /// Drought alerts created
    pub alerts_created: Counter,
    /// Currently-active alerts
    pub alerts_active: Gauge,
    /// Messages that failed to process (transport, decode or store)
    pub processing_errors: Counter,
    /// Time to process one queue message, in milliseconds
    pub processing_duration_ms: Histogram,
}

impl AppMetrics {
    /// Build and register all metrics on a fresh registry
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let measurements_saved = Counter::with_opts(Opts::new(
            "measurements_saved_total",
            "Total measurements saved to the store",
        ))?;
        let alerts_created = Counter::with_opts(Opts::new(
            "alerts_created_total",
            "Total alerts created",
        ))?;
        let alerts_active = Gauge::with_opts(Opts::new(
            "alerts_active_total",
            "Currently active alerts",
        ))?;
        let processing_errors = Counter::with_opts(Opts::new(
            "processing_errors_total",
            "Total message processing errors",
        ))?;
        let processing_duration_ms = Histogram::with_opts(
            HistogramOpts::new(
                "message_processing_duration_ms",
                "Time to process one queue message in milliseconds",
            )
            .buckets(vec![
                1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0,
            ]),
        )?;

        registry.register(Box::new(measurements_saved.clone()))?;
        registry.register(Box::new(alerts_created.clone()))?;
        registry.register(Box::new(alerts_active.clone()))?;
        registry.register(Box::new(processing_errors.clone()))?;
        registry.register(Box::new(processing_duration_ms.clone()))?;

        Ok(Self {
            registry,
            measurements_saved,
            alerts_created,
            alerts_active,
            processing_errors,
            processing_duration_ms,
        })
    }

    /// Render the registry in Prometheus text exposition format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_contains_contract_names() {
        let metrics = AppMetrics::new().unwrap();

        metrics.measurements_saved.inc();
        metrics.alerts_created.inc();
        metrics.alerts_active.set(1.0);
        metrics.processing_errors.inc();
        metrics.processing_duration_ms.observe(12.0);

        let text = metrics.export().unwrap();
        assert!(text.contains("measurements_saved_total"));
        assert!(text.contains("alerts_created_total"));
        assert!(text.contains("alerts_active_total"));
        assert!(text.contains("processing_errors_total"));
        assert!(text.contains("message_processing_duration_ms"));
    }

    #[test]
    fn test_handles_are_independent() {
        let a = AppMetrics::new().unwrap();
        let b = AppMetrics::new().unwrap();

        a.measurements_saved.inc();
        assert_eq!(a.measurements_saved.get(), 1.0);
        assert_eq!(b.measurements_saved.get(), 0.0);
    }
}
