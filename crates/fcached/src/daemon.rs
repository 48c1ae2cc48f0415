//! Daemon lifecycle: backend check, HTTP server, systemd notify, shutdown

use anyhow::{Context, Result};
use fcache_core::FcacheConfig;
use fcache_store::{ChunkStore, StoreOptions};
use tracing::{info, warn};

use crate::http::{router, AppState};

pub async fn run(config: FcacheConfig) -> Result<()> {
    info!("daemon starting");

    let options = StoreOptions::from_config(&config).context("chunking config")?;
    let operator = fcache_storage::build_operator(&config.backend)?;

    // A backend that is down at startup may come back; /readyz reports it
    match fcache_storage::check_health(&operator).await {
        Ok(()) => info!(endpoint = %config.backend.endpoint, "backend: connected"),
        Err(e) => warn!(endpoint = %config.backend.endpoint, "backend: {e}"),
    }

    info!(
        strategy = %options.strategy,
        min_chunk = options.bounds.min(),
        max_chunk = options.bounds.max(),
        max_file_size = options.max_file_size,
        "chunk store ready"
    );

    let store = ChunkStore::with_options(operator, options);
    let app = router(AppState::new(store));

    let addr = config.daemon.listen.clone();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("http bind {addr}"))?;
    info!(addr = %addr, "http: listening on /filecache, /healthz, /readyz, /metrics");

    notify_ready();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server")?;

    info!("daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!("registering SIGTERM handler failed: {e}");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = sigterm.recv() => info!("SIGTERM received, shutting down"),
        _ = tokio::signal::ctrl_c() => info!("SIGINT received, shutting down"),
    }
}

fn notify_ready() {
    // sd_notify(READY=1) via $NOTIFY_SOCKET; no-op outside systemd
    if let Ok(socket) = std::env::var("NOTIFY_SOCKET") {
        use std::os::unix::net::UnixDatagram;
        if let Ok(sock) = UnixDatagram::unbound() {
            let _ = sock.send_to(b"READY=1\n", &socket);
            tracing::debug!(notify_socket = %socket, "sent systemd READY=1");
        }
    }
}
