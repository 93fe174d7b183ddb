//! HTTP server infrastructure for stablemap
//!
//! [`HttpServer`] wraps an Axum router behind the [`Server`] trait, so the
//! binary starts, monitors and stops it the same way it stops the refresh
//! worker: through a `CancellationToken` handed out by
//! [`ShutdownController`].
//!
//! ```ignore
//! use server::{HttpServer, Server, ServerConfig, ShutdownController};
//!
//! let shutdown = ShutdownController::with_signals();
//! let server = HttpServer::new(ServerConfig::default(), router);
//! server.run(shutdown.child_token()).await?;
//! ```

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod port_validator;
pub mod shutdown;
pub mod traits;

pub use config::{ports, ServerConfig};
pub use error::{Result, ServerError};
pub use health::{health_routes, HealthState, SourceStatus};
pub use http::HttpServer;
pub use port_validator::{validate_config_ports, validate_ports_available};
pub use shutdown::ShutdownController;
pub use traits::{Server, ServerExt};
