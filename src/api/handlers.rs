use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::metrics::AppMetrics;
use crate::queue::WorkQueue;

/// Application state shared across handlers
pub struct AppState {
    pub metrics: Arc<AppMetrics>,
    pub queue: Arc<dyn WorkQueue>,
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================================
// Metrics
// ============================================================================

/// Prometheus text exposition of the application registry
pub async fn metrics(State(state): State<Arc<AppState>>) -> (StatusCode, String) {
    match state.metrics.export() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

// ============================================================================
// Producer
// ============================================================================

#[derive(Serialize)]
pub struct EnqueueResponse {
    pub message_id: String,
}

/// Accept a raw sensor payload and enqueue it for the consumer. The body is
/// not validated here; decode failures surface through the consumer's
/// redelivery path like any other malformed message.
pub async fn enqueue_message(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<EnqueueResponse>, (StatusCode, String)> {
    let message_id = state
        .queue
        .send(body)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(EnqueueResponse { message_id }))
}
