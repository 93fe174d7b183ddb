use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("{provider}: request failed: {message}")]
    Request { provider: &'static str, message: String },

    #[error("{provider}: HTTP {status} from {url}")]
    Status {
        provider: &'static str,
        status: u16,
        url: String,
    },

    #[error("{provider}: rate limited after retry")]
    RateLimited { provider: &'static str },

    #[error("{provider}: unexpected response: {message}")]
    Decode { provider: &'static str, message: String },

    #[error("{provider}: no usable data: {message}")]
    NoData { provider: &'static str, message: String },

    #[error("fixture {path}: {message}")]
    Fixture { path: String, message: String },
}

impl SourceError {
    pub fn decode(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            provider,
            message: message.into(),
        }
    }

    pub fn no_data(provider: &'static str, message: impl Into<String>) -> Self {
        Self::NoData {
            provider,
            message: message.into(),
        }
    }
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;
