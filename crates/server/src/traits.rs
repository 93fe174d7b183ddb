//! Server lifecycle traits

use async_trait::async_trait;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// A long-running listener with graceful shutdown
///
/// Implemented by [`HttpServer`](crate::http::HttpServer).
#[async_trait]
pub trait Server: Send + Sync + 'static {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Bound address while running
    fn address(&self) -> Option<SocketAddr>;

    fn is_running(&self) -> bool;

    /// Bind, serve until `shutdown` is cancelled, then drain in-flight
    /// requests. Errors when binding fails or the listener dies.
    async fn run(&self, shutdown: CancellationToken) -> Result<()>;
}

/// Convenience methods for every [`Server`]
pub trait ServerExt: Server + Sized {
    /// Run on a new task; cancel the returned token to stop it
    fn spawn(self) -> (tokio::task::JoinHandle<Result<()>>, CancellationToken) {
        let token = CancellationToken::new();
        let token_clone = token.clone();
        let handle = tokio::spawn(async move { self.run(token_clone).await });
        (handle, token)
    }
}

impl<T: Server + Sized> ServerExt for T {}

#[cfg(test)]
mod tests {
    use super::*;

    struct IdleServer;

    #[async_trait]
    impl Server for IdleServer {
        fn name(&self) -> &str {
            "idle"
        }

        fn address(&self) -> Option<SocketAddr> {
            None
        }

        fn is_running(&self) -> bool {
            false
        }

        async fn run(&self, shutdown: CancellationToken) -> Result<()> {
            shutdown.cancelled().await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_spawned_server_stops_on_cancel() {
        let (handle, token) = IdleServer.spawn();
        token.cancel();

        let result = tokio::time::timeout(std::time::Duration::from_secs(1), handle).await;
        assert!(matches!(result, Ok(Ok(Ok(())))));
    }
}
