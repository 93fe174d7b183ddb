//! Reference data error types

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the reference tables
#[derive(Error, Debug)]
pub enum ReferenceDataError {
    #[error("Failed to parse {document}: {source}")]
    Parse {
        document: &'static str,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{document}: {message}")]
    Invalid {
        document: &'static str,
        message: String,
    },
}

impl ReferenceDataError {
    pub fn invalid(document: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            document,
            message: message.into(),
        }
    }
}

/// Result type for reference data operations
pub type Result<T> = std::result::Result<T, ReferenceDataError>;
