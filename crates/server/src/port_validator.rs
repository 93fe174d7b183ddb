//! Port checks run before the server binds
//!
//! A successful check does not reserve the port; the real bind can still
//! fail. These only give early feedback at startup.

use std::collections::HashSet;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};

/// Check that every port in `config` can currently be bound
pub async fn validate_ports_available(config: &ServerConfig) -> Result<()> {
    info!("Validating server ports...");

    for (label, port) in config.bound_ports() {
        validate_single_port(&config.host, port, label).await?;
    }

    info!("All server ports validated successfully");
    Ok(())
}

async fn validate_single_port(host: &str, port: u16, label: &str) -> Result<()> {
    let addr = format!("{}:{}", host, port);
    debug!("Checking {} port {}", label, port);

    match TcpListener::bind(&addr).await {
        Ok(listener) => {
            let local_addr = listener
                .local_addr()
                .map_err(|e| ServerError::bind(addr.clone(), e))?;
            drop(listener);

            info!("{} port {} is available ({})", label, port, local_addr);
            Ok(())
        }
        Err(e) => {
            error!("{} port {} is NOT available: {}", label, port, e);
            Err(ServerError::port_in_use(port, e.to_string()))
        }
    }
}

/// `true` if binding `host:port` fails right now
pub async fn is_port_in_use(host: &str, port: u16) -> bool {
    let addr = format!("{}:{}", host, port);
    TcpListener::bind(&addr).await.is_err()
}

/// Rejects port 0 and warns on privileged ports
pub fn validate_port_range(port: u16) -> Result<()> {
    if port == 0 {
        Err(ServerError::ConfigError(
            "Port cannot be 0 (ephemeral port assignment not supported for explicit binding)"
                .to_string(),
        ))
    } else {
        if port < 1024 {
            warn!("Port {} is a privileged port (requires root/admin privileges)", port);
        }
        Ok(())
    }
}

/// Range-check every port and reject two services on the same port
pub fn validate_config_ports(config: &ServerConfig) -> Result<()> {
    let mut seen = HashSet::new();
    for (label, port) in config.bound_ports() {
        validate_port_range(port)?;
        if !seen.insert(port) {
            return Err(ServerError::ConfigError(format!(
                "{} port {} is already assigned to another listener",
                label, port
            )));
        }
    }
    Ok(())
}
