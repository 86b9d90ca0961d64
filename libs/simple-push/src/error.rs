use thiserror::Error;

use crate::response::ServerError;

/// Error type for push operations
#[derive(Error, Debug)]
pub enum PushError {
    #[error("Failed to load client identity: {0}")]
    IdentityLoad(String),

    #[error("Failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("APNs reported an error: {0}")]
    ServerReported(ServerError),

    #[error("APNs responded with status {0}")]
    Status(u16),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Invalid device token: {0}")]
    InvalidToken(String),

    #[error("Push configuration error: {0}")]
    Config(String),

    #[error("No async runtime available: {0}")]
    Runtime(String),
}

impl PushError {
    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            PushError::Status(code) => Some(*code),
            _ => None,
        }
    }
}

/// Failure below the HTTP layer: DNS, connect, TLS handshake, timeout
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to build HTTP client: {0}")]
    Build(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_builder() {
            TransportError::Build(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, PushError>;
