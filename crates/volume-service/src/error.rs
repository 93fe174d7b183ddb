//! Service error types

use reference_data::ReferenceDataError;
use sources::SourceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    /// No refresh has succeeded yet
    #[error("volume data is not available yet")]
    NotReady,

    /// A required upstream input could not be fetched
    #[error("failed to fetch {input}: {error}")]
    Upstream {
        input: &'static str,
        #[source]
        error: SourceError,
    },

    #[error("invalid filter '{0}', expected one of: all, usdt, usdc, dai")]
    InvalidFilter(String),

    #[error("no regulation entry for country code '{0}'")]
    UnknownCountry(String),

    #[error("reference data: {0}")]
    ReferenceData(#[from] ReferenceDataError),

    #[error("source setup: {0}")]
    Setup(String),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[cfg(feature = "api")]
mod response {
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::Json;
    use serde_json::json;

    use super::ServiceError;

    impl ServiceError {
        pub fn status_code(&self) -> StatusCode {
            match self {
                Self::NotReady | Self::Upstream { .. } => StatusCode::SERVICE_UNAVAILABLE,
                Self::InvalidFilter(_) => StatusCode::BAD_REQUEST,
                Self::UnknownCountry(_) => StatusCode::NOT_FOUND,
                Self::ReferenceData(_) | Self::Setup(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    }

    impl IntoResponse for ServiceError {
        fn into_response(self) -> Response {
            let status = self.status_code();
            if status.is_server_error() {
                tracing::warn!(error = %self, "Request failed");
            }
            (status, Json(json!({ "error": self.to_string() }))).into_response()
        }
    }
}
