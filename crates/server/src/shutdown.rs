//! Shutdown coordination
//!
//! One root `CancellationToken`; the HTTP server and the refresh worker each
//! get a child token, so cancelling the root stops both while either can be
//! stopped alone.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Owns the root shutdown token
///
/// ```ignore
/// let shutdown = ShutdownController::with_signals();
/// let worker = tokio::spawn(worker.run(shutdown.child_token()));
/// http_server.run(shutdown.child_token()).await?;
/// ```
#[derive(Clone, Default)]
pub struct ShutdownController {
    token: CancellationToken,
}

impl ShutdownController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels on Ctrl+C, and on SIGTERM under unix
    pub fn with_signals() -> Self {
        let controller = Self::new();
        let token = controller.token.clone();

        tokio::spawn(async move {
            wait_for_signal().await;
            token.cancel();
        });

        controller
    }

    pub fn child_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn shutdown(&self) {
        info!("Manual shutdown triggered");
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn wait_for_shutdown(&self) {
        self.token.cancelled().await;
    }
}

async fn wait_for_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown..."),
            Err(e) => {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, initiating graceful shutdown...");
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_manual_shutdown_reaches_children() {
        let controller = ShutdownController::new();
        let token = controller.child_token();
        assert!(!token.is_cancelled());

        controller.shutdown();

        assert!(controller.is_cancelled());
        assert!(token.is_cancelled());
        controller.wait_for_shutdown().await;
    }

    #[tokio::test]
    async fn test_child_token_independence() {
        let controller = ShutdownController::new();
        let worker = controller.child_token();
        let http = controller.child_token();

        worker.cancel();
        assert!(!http.is_cancelled());
        assert!(!controller.is_cancelled());

        controller.shutdown();
        assert!(http.is_cancelled());
    }
}
