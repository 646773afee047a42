//! Error types for mimir-client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Transport failure reported by a non-reqwest transport.
    #[error("transport error: {0}")]
    TransportMessage(String),

    #[error("request failed ({status})")]
    Api {
        status: u16,
        /// Parsed response body, `None` when empty or not JSON.
        body: Option<serde_json::Value>,
    },

    #[error("unexpected response payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("telemetry error: {0}")]
    Telemetry(String),
}

impl Error {
    /// Whether the request engine should try again after this error.
    ///
    /// Only failures to complete the exchange and non-2xx responses are
    /// retried. A completed exchange with a malformed payload is not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::TransportMessage(_) | Error::Api { .. }
        )
    }

    /// HTTP status code, if this is a protocol failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
