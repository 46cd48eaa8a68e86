//! Alert model

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of alert. Only drought is defined; dedup and count queries key on
/// (plot, type) so new kinds slot in without schema changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertType {
    #[serde(rename = "DROUGHT")]
    Drought,
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertType::Drought => write!(f, "DROUGHT"),
        }
    }
}

/// An alert raised for a plot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Unique record id
    pub id: Uuid,
    /// Plot the alert applies to
    pub plot_id: String,
    /// Kind of alert
    pub alert_type: AlertType,
    /// Human-readable summary of what triggered it
    pub message: String,
    /// Active alerts participate in dedup; deactivation is a future concern
    pub active: bool,
    /// When the rule fired
    pub triggered_at: DateTime<Utc>,
}

impl Alert {
    /// Create an active drought alert for a plot
    pub fn drought(plot_id: impl Into<String>, humidity_threshold: f64, window_hours: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            plot_id: plot_id.into(),
            alert_type: AlertType::Drought,
            message: format!(
                "Drought alert: humidity < {}% for {}h",
                humidity_threshold, window_hours
            ),
            active: true,
            triggered_at: Utc::now(),
        }
    }
}
