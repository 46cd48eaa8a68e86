//! Sensor measurement model and wire payload

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single sensor reading for a plot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measurement {
    /// Unique record id, assigned at decode time
    pub id: Uuid,
    /// Plot the reading belongs to
    pub plot_id: String,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Temperature in degrees Celsius
    pub temperature: f64,
    /// Rainfall in millimeters
    pub rainfall: f64,
    /// Observation time, supplied by the sensor
    pub timestamp: DateTime<Utc>,
    /// Ingestion time, assigned by the system
    pub created_at: DateTime<Utc>,
}

impl Measurement {
    /// Create a measurement with a fresh id and the current ingestion time
    pub fn new(
        plot_id: impl Into<String>,
        humidity: f64,
        temperature: f64,
        rainfall: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            plot_id: plot_id.into(),
            humidity,
            temperature,
            rainfall,
            timestamp,
            created_at: Utc::now(),
        }
    }
}

/// Wire format of a queue message body.
///
/// Producers disagree on field casing, so each field accepts camelCase,
/// PascalCase and snake_case spellings. Unknown fields are ignored. Only the
/// plot id is required; numeric fields default to zero and a missing
/// timestamp falls back to the ingestion time.
#[derive(Debug, Clone, Deserialize)]
pub struct MeasurementPayload {
    #[serde(rename = "plotId", alias = "PlotId", alias = "plot_id")]
    pub plot_id: String,
    #[serde(default, alias = "Humidity")]
    pub humidity: f64,
    #[serde(default, alias = "Temperature")]
    pub temperature: f64,
    #[serde(default, alias = "Rainfall")]
    pub rainfall: f64,
    #[serde(default, alias = "Timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl MeasurementPayload {
    /// Convert the decoded payload into a measurement record
    pub fn into_measurement(self) -> Measurement {
        let now = Utc::now();
        Measurement {
            id: Uuid::new_v4(),
            plot_id: self.plot_id,
            humidity: self.humidity,
            temperature: self.temperature,
            rainfall: self.rainfall,
            timestamp: self.timestamp.unwrap_or(now),
            created_at: now,
        }
    }
}
