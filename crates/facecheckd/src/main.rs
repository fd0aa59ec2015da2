use anyhow::{Context, Result};
use facecheck_core::OnnxFaceEncoder;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;
mod dto;
mod error;
mod extract;
mod handlers;
mod routes;
mod state;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::Config::from_env();
    tracing::info!(
        bind = %config.bind_addr,
        profile_dir = %config.profile_dir.display(),
        live_capture_dir = %config.live_capture_dir.display(),
        model_dir = %config.model_dir.display(),
        "facecheckd starting"
    );

    let layout = config.layout();
    layout
        .ensure_dirs()
        .context("failed to create storage directories")?;

    // Missing or corrupt models fail startup rather than the first request.
    let encoder = OnnxFaceEncoder::load(&config.model_dir, config.intra_threads)
        .context("failed to load face models")?;
    tracing::info!("face models loaded");

    let state = state::AppState::new(layout, Arc::new(encoder));
    let app = routes::router(state, routes::cors_layer(&config.cors_origins));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "facecheckd ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("facecheckd shutting down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
