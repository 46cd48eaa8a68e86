use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{enqueue_message, health_check, metrics, AppState};
use crate::alerts::AlertEngine;
use crate::config::AppConfig;
use crate::ingest::QueueConsumer;
use crate::metrics::AppMetrics;
use crate::queue::InMemoryQueue;
use crate::storage::MemoryStore;

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/messages", post(enqueue_message))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Wire the store, queue, engine and consumer, then serve until ctrl-c
pub async fn run_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let metrics = Arc::new(AppMetrics::new()?);
    let store = Arc::new(MemoryStore::new());
    let queue = Arc::new(InMemoryQueue::new(config.queue.url.clone()));

    let engine = Arc::new(AlertEngine::new(
        store.clone(),
        store.clone(),
        Arc::clone(&metrics),
        config.rule.clone(),
    ));

    let mut consumer = QueueConsumer::new(
        queue.clone(),
        engine,
        Arc::clone(&metrics),
        config.consumer.clone(),
    );
    let consumer_handle = consumer.start();
    tracing::info!(queue_url = %queue.url(), "Consumer attached to queue");

    let state = Arc::new(AppState {
        metrics,
        queue: queue.clone(),
    });
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Starting plotwatch server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    consumer.stop().await;
    let _ = consumer_handle.await;

    tracing::info!("plotwatch stopped");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");

    tracing::info!("Shutdown signal received, stopping consumer...");
}
