//! HTTP server implementation using Axum

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    Router,
};
use observability::{RequestMetricsGuard, ServerMetrics};
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::traits::Server;

/// Serves an Axum router until its shutdown token is cancelled
///
/// ```ignore
/// use server::{HttpServer, Server, ServerConfig, ShutdownController};
///
/// let shutdown = ShutdownController::with_signals();
/// let server = HttpServer::new(ServerConfig::local(8080), router)
///     .with_request_metrics("stablemap");
/// server.run(shutdown.child_token()).await?;
/// ```
#[derive(Clone)]
pub struct HttpServer {
    config: ServerConfig,
    router: Router,
    running: Arc<AtomicBool>,
    bound_addr: Arc<RwLock<Option<SocketAddr>>>,
}

impl HttpServer {
    pub fn new(config: ServerConfig, router: Router) -> Self {
        Self {
            config,
            router,
            running: Arc::new(AtomicBool::new(false)),
            bound_addr: Arc::new(RwLock::new(None)),
        }
    }

    /// Record count, status and latency of every request under `server_name`
    pub fn with_request_metrics(mut self, server_name: &str) -> Self {
        let metrics = ServerMetrics::new(server_name);
        self.router = self
            .router
            .layer(middleware::from_fn_with_state(metrics, track_request));
        self
    }
}

async fn track_request(State(metrics): State<ServerMetrics>, request: Request, next: Next) -> Response {
    let mut guard = RequestMetricsGuard::new(&metrics);
    let response = next.run(request).await;
    guard.set_status(response.status().as_u16());
    response
}

#[async_trait]
impl Server for HttpServer {
    fn name(&self) -> &str {
        "http"
    }

    fn address(&self) -> Option<SocketAddr> {
        *self.bound_addr.read()
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn run(&self, shutdown_token: CancellationToken) -> Result<()> {
        let addr = self.config.http_addr()?;

        info!(%addr, "Starting HTTP server");

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::bind(addr.to_string(), e))?;

        let local_addr = listener.local_addr().map_err(ServerError::Io)?;
        *self.bound_addr.write() = Some(local_addr);

        info!(%local_addr, "HTTP server listening");

        self.running.store(true, Ordering::SeqCst);

        let result = axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move {
                shutdown_token.cancelled().await;
                info!("HTTP server received shutdown signal");
            })
            .await;

        self.running.store(false, Ordering::SeqCst);
        *self.bound_addr.write() = None;

        match result {
            Ok(()) => {
                info!("HTTP server shutdown complete");
                Ok(())
            }
            Err(e) => {
                error!(%e, "HTTP server error");
                Err(ServerError::Io(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ServerExt;
    use axum::routing::get;
    use std::time::Duration;

    fn router() -> Router {
        Router::new().route("/", get(|| async { "stablemap" }))
    }

    #[tokio::test]
    async fn test_http_server_binds_and_shuts_down() {
        let server = HttpServer::new(ServerConfig::local(0), router()).with_request_metrics("test");
        let probe = server.clone();
        let (handle, token) = server.spawn();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(probe.is_running());
        assert!(probe.address().is_some_and(|a| a.port() != 0));

        token.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(result.is_ok(), "Server should shutdown within timeout");
        assert!(!probe.is_running());
        assert!(probe.address().is_none());
    }

    #[tokio::test]
    async fn test_bind_failure() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let server = HttpServer::new(ServerConfig::local(port), router());
        let result = server.run(CancellationToken::new()).await;
        assert!(matches!(result, Err(ServerError::BindError { .. })));
    }
}
