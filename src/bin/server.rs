//! rentcast Server - HTTP prediction service
//!
//! Serves rent predictions from the artifact written by `train_ml`.
//!
//! # Usage
//! ```sh
//! ARTIFACT_PATH=data/ml/rent_model.json cargo run --bin server
//! ```
//!
//! # Environment Variables
//! - `ARTIFACT_PATH` - Trained artifact to serve (default: data/ml/rent_model.json)
//! - `SERVER_BIND_ADDRESS` / `SERVER_PORT` - Listen address (default: 127.0.0.1:8000)
//! - `SERVER_PRELOAD` - Load the artifact before accepting requests (default: true)

use anyhow::{Context, Result};
use rentcast::application::ml::ModelServer;
use rentcast::config::Config;
use rentcast::infrastructure::FsArtifactStore;
use rentcast::infrastructure::observability::Metrics;
use rentcast::interfaces::api::{AppState, create_router_with_state};
use std::sync::Arc;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("rentcast server {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: artifact={:?}, target={}, listen={}:{}",
        config.model.artifact_path, config.model.target, config.server.bind_address, config.server.port
    );

    let metrics = Metrics::new().context("Failed to create metrics registry")?;
    let store = Arc::new(FsArtifactStore::new(&config.model.artifact_path));
    let model_server = ModelServer::new(store).with_metrics(metrics.clone());

    if config.server.preload {
        // A missing artifact is not fatal: requests return 500 until one is trained.
        match tokio::task::block_in_place(|| model_server.preload()) {
            Ok(artifact) => info!(
                "Artifact preloaded ({} training rows)",
                artifact.summary.train_rows
            ),
            Err(e) => warn!("Starting without a model: {}", e),
        }
    }

    let state = AppState::new(Arc::new(model_server), metrics);
    let app = create_router_with_state(state);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}. Press Ctrl+C to shutdown.", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received. Exiting...");
        })
        .await
        .context("Server error")?;

    Ok(())
}
