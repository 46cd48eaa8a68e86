//! HTTP surface: health, Prometheus metrics and the local producer route

pub mod handlers;
pub mod server;

pub use handlers::AppState;
pub use server::{build_router, run_server};
