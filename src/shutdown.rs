//! Graceful shutdown.
//!
//! The server stops accepting connections on SIGINT or SIGTERM, then gets a
//! bounded window to drain in-flight requests.

use axum::Router;
use std::future::IntoFuture;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Waits for SIGTERM or SIGINT
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}

/// Serve `app` until a shutdown signal, then drain for at most `drain_timeout`.
///
/// # Errors
///
/// Returns the server's I/O error if it stops on its own.
pub async fn serve_with_graceful_shutdown(
    listener: TcpListener,
    app: Router,
    drain_timeout: Duration,
) -> std::io::Result<()> {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.wait_for(|stop| *stop).await;
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            match &result {
                Ok(()) => info!("Server stopped normally"),
                Err(e) => error!(error = %e, "Server error"),
            }
            return result;
        }
        () = wait_for_signal() => {
            info!("Shutdown signal received, draining connections");
        }
    }

    let _ = shutdown_tx.send(true);

    match tokio::time::timeout(drain_timeout, server).await {
        Ok(result) => {
            info!("Shutdown complete");
            result
        }
        Err(_) => {
            warn!(?drain_timeout, "Shutdown timeout reached, dropping remaining connections");
            Ok(())
        }
    }
}
