//! Server configuration

use crate::error::{Result, ServerError};
use std::net::SocketAddr;

/// Default port assignments
pub mod ports {
    /// Volume API
    pub const STABLEMAP_HTTP: u16 = 8080;
    /// Prometheus exporter
    pub const METRICS: u16 = 9090;
}

/// Where the HTTP API binds, and the metrics port it must not collide with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
    /// Port of the metrics exporter, when it is enabled
    pub metrics_port: Option<u16>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            http_port: ports::STABLEMAP_HTTP,
            metrics_port: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, http_port: u16) -> Self {
        Self {
            host: host.into(),
            http_port,
            metrics_port: None,
        }
    }

    /// Loopback on `port`; port 0 picks an ephemeral port
    pub fn local(port: u16) -> Self {
        Self::new("127.0.0.1", port)
    }

    pub fn with_metrics_port(mut self, port: Option<u16>) -> Self {
        self.metrics_port = port;
        self
    }

    pub fn http_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.http_port);
        addr.parse().map_err(|_| ServerError::InvalidAddress(addr))
    }

    /// Every port this process will bind, labelled
    pub fn bound_ports(&self) -> Vec<(&'static str, u16)> {
        let mut ports = vec![("HTTP", self.http_port)];
        if let Some(port) = self.metrics_port {
            ports.push(("metrics", port));
        }
        ports
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_port, ports::STABLEMAP_HTTP);
        assert_eq!(config.http_addr().unwrap().port(), 8080);
        assert_eq!(config.bound_ports(), vec![("HTTP", 8080)]);
    }

    #[test]
    fn test_metrics_port_is_listed() {
        let config = ServerConfig::new("127.0.0.1", 8081).with_metrics_port(Some(ports::METRICS));
        assert_eq!(config.bound_ports(), vec![("HTTP", 8081), ("metrics", 9090)]);
    }

    #[test]
    fn test_invalid_host() {
        let config = ServerConfig::new("not a host", 8080);
        assert!(matches!(config.http_addr(), Err(ServerError::InvalidAddress(_))));
    }
}
