//! # Termination signals.
//!
//! [`shutdown_signal`] completes when the process is asked to terminate.
//!
//! **Unix:** `SIGINT` (Ctrl-C), `SIGTERM`, `SIGQUIT`.
//! **Other platforms:** Ctrl-C via [`tokio::signal::ctrl_c`].
//!
//! If the listeners cannot be installed the failure is logged and the future
//! never completes, so the host falls back to its cancellation token.

use std::future::pending;

/// Completes on the first termination signal.
pub(crate) async fn shutdown_signal() {
    if let Err(e) = wait_for_signal().await {
        tracing::warn!(
            target: "widgetvisor",
            error = %e,
            "cannot listen for termination signals; relying on the cancellation token"
        );
        pending::<()>().await;
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = sigint.recv() => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
