use axum::Router;
use color_eyre::eyre::{eyre, Result};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::ServerConfig;

/// Binds the listening socket and serves `app` until `shutdown` fires.
///
/// In-flight requests are allowed to finish before this returns.
pub async fn serve(config: &ServerConfig, app: Router, shutdown: CancellationToken) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind HTTP listener on {}: {}", addr, e))?;

    let local = listener
        .local_addr()
        .map_err(|e| eyre!("Failed to read local address: {}", e))?;
    info!("Relay listening on http://{}", local);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| eyre!("HTTP server error: {}", e))?;

    info!("HTTP server stopped");
    Ok(())
}
