use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

mod controllers;
mod models;
mod routers;
mod secrets;

use controllers::{MetadataExtractor, ProxyController, StreamController, YtDlp};
use routers::{AppState, app};
use secrets::Settings;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let settings = Settings::load()?;

    let ytdlp = YtDlp::new(settings.ytdlp_bin.clone(), settings.ytdlp_timeout);
    match ytdlp.version().await {
        Some(version) => info!("🎵 Using {} {}", settings.ytdlp_bin, version),
        None => warn!(
            "⚠️ {} is not runnable; /api/stream will fail until it is installed",
            settings.ytdlp_bin
        ),
    }

    let state = AppState {
        stream: Arc::new(StreamController::new(Arc::new(ytdlp))),
        proxy: Arc::new(
            ProxyController::new(&settings).context("Failed to build proxy HTTP client")?,
        ),
    };
    if !settings.proxy_allowed_hosts.is_empty() {
        info!("Proxy restricted to hosts: {:?}", settings.proxy_allowed_hosts);
    }

    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🎧 Audio relay listening on http://{}", addr);
    info!("📡 Resolver endpoint: /api/stream?video={{id-or-url}}");
    info!("📡 Proxy endpoint: /api/proxy?url={{audio-url}}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
