//! notebox API server.
//!
//! Reads configuration from the environment, builds the pipeline and
//! serves the router until interrupted.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use notebox_api::auth::StaticSessionProvider;
use notebox_api::{app, AppConfig, AppState};
use notebox_crypto::master_key::MASTER_KEY_ENV;
use notebox_crypto::MasterKey;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().context("loading configuration")?;
    let master_key = MasterKey::from_env(MASTER_KEY_ENV).context("loading master key")?;
    let sessions = StaticSessionProvider::from_env().context("loading sessions")?;
    tracing::info!(sessions = sessions.len(), "session provider loaded");

    let state = AppState::from_config(&config, master_key, Arc::new(sessions))
        .context("building application state")?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("notebox-api listening on {addr}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
