//! # certreg-api: Binary Entry Point
//!
//! Parses configuration, bootstraps the ledger, and serves HTTP until
//! Ctrl-C.

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use certreg_api::auth::AuthConfig;
use certreg_api::config::{LogFormat, ServeConfig};
use certreg_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServeConfig::parse();
    init_tracing(config.log_format);

    tracing::debug!(?config, "configuration loaded");

    let auth = AuthConfig::new(config.api_keys.clone()).context("invalid API key table")?;
    if auth.is_empty() {
        tracing::warn!("no API keys configured; every mutating request will be rejected");
    } else {
        tracing::info!(keys = auth.len(), "API keys loaded");
    }

    let db_pool = certreg_api::db::init_pool(config.database_url.as_deref())
        .await
        .map_err(|e| {
            tracing::error!("Database initialization failed: {e}");
            e
        })
        .context("database initialization failed")?;

    let registry = certreg_api::bootstrap::bootstrap(&config, db_pool.as_ref())
        .await
        .map_err(|e| {
            tracing::error!("Bootstrap failed: {e}");
            e
        })
        .context("ledger bootstrap failed")?;

    let mut state = AppState::new(registry).with_auth(auth);
    if let Some(pool) = db_pool {
        state = state.with_db(pool);
    }
    match certreg_api::middleware::metrics::install_recorder() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => tracing::warn!("Prometheus recorder not installed: {e}"),
    }

    let app = certreg_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Certificate registry listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Certificate registry stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
