//! Tracing subscriber setup.

use std::fmt;
use tracing_subscriber::{fmt as tracing_fmt, prelude::*, EnvFilter};

/// Filter used when `RUST_LOG` is unset
const DEFAULT_FILTER: &str = "info";

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable with colors
    #[default]
    Pretty,
    /// One JSON object per line, for log shippers
    Json,
    /// Single-line, no colors
    Compact,
}

impl LogFormat {
    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
            Self::Compact => "compact",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown log format: {}", s))
    }
}

/// Install the global subscriber. Level comes from `RUST_LOG`
/// (e.g. `info`, `volume_engine=debug,info`), defaulting to `info`.
/// Output goes to stderr; stdout is left to command output.
///
/// Fails if a subscriber is already installed.
pub fn init_logging(service_name: &str, format: LogFormat) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = match format {
        LogFormat::Pretty => registry
            .with(
                tracing_fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(true),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_fmt::layer().json().with_writer(std::io::stderr).with_current_span(false))
            .try_init(),
        LogFormat::Compact => registry
            .with(tracing_fmt::layer().compact().with_writer(std::io::stderr).with_ansi(false))
            .try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))?;

    tracing::info!(service = service_name, %format, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("pretty"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse(" JSON "), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("compact"), Some(LogFormat::Compact));
        assert_eq!(LogFormat::parse("xml"), None);

        assert_eq!("compact".parse::<LogFormat>(), Ok(LogFormat::Compact));
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Json.to_string(), "json");
    }
}
