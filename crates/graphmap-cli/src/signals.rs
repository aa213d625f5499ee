//! Shutdown triggers for the watch daemon.

use std::fmt;
use tokio::sync::broadcast;

/// What ended the watch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Ctrl+C
    Interrupt,
    /// SIGTERM, e.g. from a service manager
    Terminate,
    /// `Daemon::shutdown` from inside the process
    Requested,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShutdownReason::Interrupt => "SIGINT",
            ShutdownReason::Terminate => "SIGTERM",
            ShutdownReason::Requested => "shutdown request",
        };
        f.write_str(name)
    }
}

/// Resolve once the daemon should stop.
///
/// If Ctrl+C cannot be listened for, that branch is disabled and the other
/// triggers still apply.
pub async fn wait_for_shutdown(mut requests: broadcast::Receiver<()>) -> ShutdownReason {
    tokio::select! {
        Ok(()) = tokio::signal::ctrl_c() => ShutdownReason::Interrupt,
        // Closed channel counts too
        _ = requests.recv() => ShutdownReason::Requested,
        _ = wait_for_sigterm() => ShutdownReason::Terminate,
    }
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to register SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await;
}
