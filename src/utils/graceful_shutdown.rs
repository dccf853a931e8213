//! Signal-driven shutdown coordination.
//!
//! One `GracefulShutdown` instance is shared between the signal-handler task
//! and the main serve loop. The first trigger wins; everything after it is a
//! no-op. On shutdown the orchestrator closes the tunnel bridge (the virtual
//! listener) before letting the real listener stop, so in-flight RPC
//! connections are never orphaned behind a dead bridge.
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::{signal, sync::broadcast};

/// What kind of shutdown was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// An operator or the platform asked us to stop (SIGINT/SIGTERM).
    Graceful,
    /// The shutdown channel itself was lost; stop anyway.
    Force,
}

pub struct GracefulShutdown {
    tx: broadcast::Sender<ShutdownReason>,
    triggered: AtomicBool,
}

impl GracefulShutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(8);
        Self {
            tx,
            triggered: AtomicBool::new(false),
        }
    }

    pub fn is_shutdown_initiated(&self) -> bool {
        self.triggered.load(Ordering::Relaxed)
    }

    /// Request shutdown. Only the first call broadcasts; later calls (a
    /// second Ctrl+C, an admin path) are ignored.
    pub fn trigger_shutdown(&self, reason: ShutdownReason) {
        if self
            .triggered
            .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            tracing::info!(?reason, "shutdown triggered");
            let _ = self.tx.send(reason);
        }
    }

    /// Block on SIGINT/SIGTERM and trigger shutdown when one arrives. Runs
    /// on its own task for the process lifetime.
    pub async fn run_signal_handler(&self) {
        tokio::select! {
            _ = signal::ctrl_c() => tracing::info!("received SIGINT"),
            _ = sigterm() => tracing::info!("received SIGTERM"),
        }
        self.trigger_shutdown(ShutdownReason::Graceful);
    }

    /// Suspend until shutdown is triggered. Used as one arm of the main
    /// serve loop's select.
    pub async fn wait_for_shutdown_signal(&self) -> ShutdownReason {
        let mut rx = self.tx.subscribe();
        rx.recv().await.unwrap_or_else(|_| {
            tracing::warn!("shutdown channel closed, forcing shutdown");
            ShutdownReason::Force
        })
    }
}

impl Default for GracefulShutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn sigterm() {
    use tokio::signal::unix::{SignalKind, signal};
    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            // Without a SIGTERM handler only Ctrl+C can stop us; keep the
            // other select arm alive rather than aborting startup.
            tracing::error!(error = %e, "failed to register SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn sigterm() {
    std::future::pending::<()>().await;
}
