use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod access_log;
mod api;
mod cache;
mod config;
mod error;
mod state;
mod store;

pub use config::Config;

use config::LogFormat;
use state::AppState;

const DEFAULT_LOG_FILTER: &str = "demo_api=info,tower_http=warn";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // When invoked as a Docker HEALTHCHECK, hit /healthz and exit immediately.
    // This avoids needing any external tool (curl/wget) in the container image.
    if std::env::args().nth(1).as_deref() == Some("--healthcheck") {
        let port = std::env::var("DEMO_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8080);
        let healthy = probe(&format!("http://127.0.0.1:{port}/healthz")).await;
        std::process::exit(if healthy { 0 } else { 1 });
    }

    let config_path = std::env::var("DEMO_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Parse before tracing is up so the configured level and format apply.
    let loaded = Config::load_optional(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    let from_file = loaded.is_some();
    let config = loaded.unwrap_or_default();

    init_tracing(&config);
    if !from_file {
        info!(path = %config_path.display(), "config file not found, using defaults");
    }

    let addr = config.server.bind_addr();
    info!(
        %addr,
        name = %config.app.name,
        version = %config.app.version,
        log_format = %config.server.log_format,
        "demo-api starting"
    );

    let state = Arc::new(
        AppState::from_config(Arc::new(config))
            .await
            .context("initialising application state")?,
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "listening");

    axum::serve(
        listener,
        api::app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(config.server.log_level.as_deref().unwrap_or(DEFAULT_LOG_FILTER))
    });

    match config.server.log_format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

/// Lightweight liveness probe: `true` when `url` answers with a 2xx status.
/// Connection failures and timeouts count as unhealthy.
async fn probe(url: &str) -> bool {
    let client = match reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
    {
        Ok(c) => c,
        Err(_) => return false,
    };

    match client.get(url).send().await {
        Ok(resp) => resp.status().is_success(),
        Err(_) => false,
    }
}
