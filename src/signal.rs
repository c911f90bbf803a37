//! Signal handling and cancellation for graceful shutdown.
//!
//! A [`ShutdownToken`] is shared by the monitor loop and the command loop.
//! Both check it at every suspension point; SIGINT and SIGTERM cancel it
//! through a [`ShutdownGuard`].

use std::future::Future;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A token that can be shared across tasks to check for shutdown.
#[derive(Clone)]
pub struct ShutdownToken {
    inner: CancellationToken,
}

impl ShutdownToken {
    /// Create a new shutdown token.
    pub fn new() -> Self {
        Self {
            inner: CancellationToken::new(),
        }
    }

    /// Check if shutdown has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Request cancellation on this token and wake every waiter.
    pub fn cancel(&self) {
        self.inner.cancel();
    }

    /// Resolve once the token is cancelled.
    pub async fn cancelled(&self) {
        self.inner.cancelled().await
    }

    /// Sleep for `duration` unless cancelled first.
    ///
    /// Returns `true` when the full duration elapsed, `false` on cancellation.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.inner.cancelled() => false,
            _ = tokio::time::sleep(duration) => !self.is_cancelled(),
        }
    }

    /// Run `fut` unless cancelled first; `None` on cancellation.
    pub async fn run_until_cancelled<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            _ = self.inner.cancelled() => None,
            out = fut => Some(out),
        }
    }
}

impl Default for ShutdownToken {
    fn default() -> Self {
        Self::new()
    }
}

/// A guard that cancels a token on SIGINT or SIGTERM.
/// When created, it spawns a task that listens for both signals.
pub struct ShutdownGuard {
    _marker: (),
}

impl ShutdownGuard {
    /// Start listening for signals.
    ///
    /// If signal handlers cannot be registered (e.g., in restricted environments),
    /// the guard is still created but signal handling will be disabled.
    pub fn new(token: ShutdownToken) -> Self {
        tokio::spawn(async move {
            let sigint = match signal(SignalKind::interrupt()) {
                Ok(s) => Some(s),
                Err(e) => {
                    tracing::warn!("Failed to register SIGINT handler: {}", e);
                    None
                }
            };

            let sigterm = match signal(SignalKind::terminate()) {
                Ok(s) => Some(s),
                Err(e) => {
                    tracing::warn!("Failed to register SIGTERM handler: {}", e);
                    None
                }
            };

            match (sigint, sigterm) {
                (Some(mut int), Some(mut term)) => {
                    tokio::select! {
                        _ = int.recv() => {
                            info!("Received SIGINT, initiating graceful shutdown...")
                        }
                        _ = term.recv() => {
                            info!("Received SIGTERM, initiating graceful shutdown...")
                        }
                        _ = token.cancelled() => return,
                    }
                }
                (Some(mut int), None) => {
                    int.recv().await;
                    info!("Received SIGINT, initiating graceful shutdown...");
                }
                (None, Some(mut term)) => {
                    term.recv().await;
                    info!("Received SIGTERM, initiating graceful shutdown...");
                }
                (None, None) => {
                    tracing::warn!("No signal handlers registered - graceful shutdown disabled");
                    return;
                }
            }
            token.cancel();
        });

        Self { _marker: () }
    }
}
