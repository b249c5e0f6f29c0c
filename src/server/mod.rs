pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;

use crate::core::Pipeline;
use crate::utils::error::{AppError, Result};
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Binds `0.0.0.0:{port}` and serves until Ctrl+C or SIGTERM. A failed bind
/// (port taken, privileged port) is a configuration error and propagates so
/// the process exits non-zero.
pub async fn serve<P: Pipeline + 'static>(state: AppState<P>, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::ConfigError {
            message: format!("failed to bind {}: {}", addr, e),
        })?;
    tracing::info!("🚀 Listening on {}", addr);

    let router = build_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::IoError)?;

    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
