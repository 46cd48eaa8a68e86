//! Plotwatch server
//!
//! Run with: cargo run
//!
//! Environment variables:
//! - PLOTWATCH_HOST: Bind address (default: 0.0.0.0)
//! - PLOTWATCH_PORT: Port number (default: 9102)
//! - PLOTWATCH_QUEUE_URL: Work queue endpoint
//! - PLOTWATCH_STORE_URI / PLOTWATCH_STORE_DATABASE: Document store
//! - PLOTWATCH_DROUGHT_HUMIDITY_THRESHOLD: Drought rule threshold (default: 40.0)
//! - PLOTWATCH_DROUGHT_WINDOW_HOURS: Drought rule window (default: 24)
//! - RUST_LOG: Log level (default: info)

use plotwatch::api::run_server;
use plotwatch::config::AppConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plotwatch=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    tracing::info!("Plotwatch configuration:");
    tracing::info!("  Listen: {}:{}", config.host, config.port);
    tracing::info!("  Queue: {}", config.queue.url);
    tracing::info!("  Store database: {}", config.store.database);
    tracing::info!(
        "  Consumer: batch={} wait={:?} visibility={:?}",
        config.consumer.max_messages,
        config.consumer.wait_time,
        config.consumer.visibility_timeout
    );
    tracing::info!(
        "  Drought rule: humidity < {}% over {}h",
        config.rule.humidity_threshold,
        config.rule.window_hours
    );

    run_server(config).await
}
