//! Fieldwave Worker - Backend service for scenario embedding and routing simulation
//!
//! Turns field-service scheduling scenarios into searchable spectral
//! embeddings, renders per-feature heatmaps, and runs a greedy routing
//! simulation. Handles requests over NATS.

mod config;
mod db;
mod defaults;
mod error;
mod handlers;
mod services;
mod types;

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use services::vector_store::VectorStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs directory - use LOGS_DIR env var or default to ../logs (relative to worker)
    let logs_dir = std::env::var("LOGS_DIR").unwrap_or_else(|_| "../logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "worker.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Initialize logging - both stdout and file
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,fieldwave_worker=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer()) // stdout
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false)) // file
        .init();

    info!("Starting Fieldwave Worker...");

    // Load configuration
    let config = config::Config::from_env()?;
    info!("Configuration loaded");

    // Connect to database when configured; without it the worker still
    // serves the pure computations and reports storage unavailable for
    // persistence operations.
    let pool = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url).await?;
            info!("Connected to PostgreSQL");
            db::run_migrations(&pool).await?;
            Some(pool)
        }
        None => {
            warn!("DATABASE_URL not set, running compute-only");
            None
        }
    };

    let store = Arc::new(VectorStore::new(pool));

    // Connect to NATS
    let nats_client = async_nats::connect(&config.nats_url).await?;
    info!("Connected to NATS at {}", config.nats_url);

    // Start message handlers
    let handler_result = handlers::start_handlers(nats_client, store, &config).await;

    if let Err(e) = handler_result {
        error!("Handler error: {}", e);
        return Err(e);
    }

    Ok(())
}
