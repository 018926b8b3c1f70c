//! Server startup and lifecycle

use crate::{routes, AppState, GatewayConfig};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Run the gateway server until ctrl-c
pub async fn run_server(config: GatewayConfig) -> anyhow::Result<()> {
    run_server_with_shutdown(config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// Run server with graceful shutdown
pub async fn run_server_with_shutdown(
    config: GatewayConfig,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(config.clone()).await?);
    let reaper = spawn_reaper(Arc::clone(&state), config.reap_interval_secs);
    let app = routes::create_router(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;

    info!("Docshare gateway listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    if let Some(handle) = reaper {
        handle.abort();
    }
    info!("Gateway shutdown complete");

    Ok(())
}

/// Periodically purge expired documents. Disabled when `interval_secs` is 0.
pub fn spawn_reaper(state: Arc<AppState>, interval_secs: u64) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        return None;
    }
    info!(interval_secs, "Expired document reaper enabled");

    Some(tokio::spawn(async move {
        let mut timer = tokio::time::interval(Duration::from_secs(interval_secs));
        // The first tick completes immediately
        timer.tick().await;

        loop {
            timer.tick().await;
            match state.service.purge_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(n) => info!(removed = n, "Purged expired documents"),
                Err(e) => warn!(error = %e, "Expired document purge failed"),
            }
        }
    }))
}
