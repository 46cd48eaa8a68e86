//! Environment configuration
//!
//! Read once at startup. Variables:
//! - `PLOTWATCH_HOST` / `PLOTWATCH_PORT`: HTTP bind address (default 0.0.0.0:9102)
//! - `PLOTWATCH_QUEUE_URL`: work queue endpoint
//! - `PLOTWATCH_STORE_URI` / `PLOTWATCH_STORE_DATABASE`: document store
//! - `PLOTWATCH_MAX_MESSAGES`: messages per receive call (default 10)
//! - `PLOTWATCH_WAIT_TIME_SECS`: long-poll wait (default 10)
//! - `PLOTWATCH_VISIBILITY_TIMEOUT_SECS`: message ownership window (default 30)
//! - `PLOTWATCH_ERROR_BACKOFF_MS`: pause after a transport failure (default 2000)
//! - `PLOTWATCH_DROUGHT_HUMIDITY_THRESHOLD`: drought rule threshold (default 40.0)
//! - `PLOTWATCH_DROUGHT_WINDOW_HOURS`: drought rule window (default 24)

use std::str::FromStr;
use std::time::Duration;

use crate::alerts::DroughtRule;
use crate::ingest::ConsumerConfig;

/// Configuration errors. A missing variable falls back to its default; a
/// present but unparsable one is rejected.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: String, value: String },
}

/// Work queue endpoint settings
#[derive(Debug, Clone)]
pub struct QueueSettings {
    pub url: String,
}

/// Document store connection settings. The in-memory backing only logs
/// these; a remote store implementation consumes them.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub uri: String,
    pub database: String,
}

/// Full application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub queue: QueueSettings,
    pub store: StoreSettings,
    pub consumer: ConsumerConfig,
    pub rule: DroughtRule,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env_string("PLOTWATCH_HOST", "0.0.0.0"),
            port: env_parse("PLOTWATCH_PORT", 9102)?,
            queue: QueueSettings {
                url: env_string("PLOTWATCH_QUEUE_URL", "local://plotwatch-measurements"),
            },
            store: StoreSettings {
                uri: env_string("PLOTWATCH_STORE_URI", "memory://"),
                database: env_string("PLOTWATCH_STORE_DATABASE", "plotwatch"),
            },
            consumer: ConsumerConfig {
                max_messages: env_parse("PLOTWATCH_MAX_MESSAGES", 10)?,
                wait_time: Duration::from_secs(env_parse("PLOTWATCH_WAIT_TIME_SECS", 10u64)?),
                visibility_timeout: Duration::from_secs(env_parse(
                    "PLOTWATCH_VISIBILITY_TIMEOUT_SECS",
                    30u64,
                )?),
                error_backoff: Duration::from_millis(env_parse(
                    "PLOTWATCH_ERROR_BACKOFF_MS",
                    2000u64,
                )?),
            },
            rule: DroughtRule {
                humidity_threshold: env_parse("PLOTWATCH_DROUGHT_HUMIDITY_THRESHOLD", 40.0)?,
                window_hours: env_parse("PLOTWATCH_DROUGHT_WINDOW_HOURS", 24i64)?,
            },
        })
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value: raw.clone(),
        }),
        Err(_) => Ok(default),
    }
}
