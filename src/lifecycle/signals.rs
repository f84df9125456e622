//! OS signal handling.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::watcher::ConfigWatcher;

/// Resolve once Ctrl-C or SIGTERM arrives.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}

/// Reload the configuration through `watcher` on every SIGHUP.
#[cfg(unix)]
pub fn spawn_reload_on_hangup(watcher: ConfigWatcher, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hangups = match signal(SignalKind::hangup()) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGHUP");
                return;
            }
        };

        loop {
            tokio::select! {
                _ = hangups.recv() => {
                    tracing::info!("Received SIGHUP, reloading configuration");
                    watcher.reload();
                }
                _ = shutdown.recv() => break,
            }
        }
    })
}

/// SIGHUP does not exist here; the task only waits for shutdown.
#[cfg(not(unix))]
pub fn spawn_reload_on_hangup(_watcher: ConfigWatcher, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let _ = shutdown.recv().await;
    })
}
