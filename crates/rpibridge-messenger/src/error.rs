//! Messaging error types.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for messaging operations.
pub type MessengerResult<T> = Result<T, MessengerError>;

/// Errors surfaced by the messaging bridge.
#[derive(Debug, Error)]
pub enum MessengerError {
    /// Caller input was rejected before any network I/O.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("converting master state to master info: {0}")]
    Conversion(String),

    /// The remote answered, but not with 200 or 202.
    #[error("expected 200 or 202 response from {destination}, got {status}")]
    Protocol { destination: String, status: u16 },

    #[error("{context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: TransportError,
    },

    #[error("encoding message: {0}")]
    Encode(String),
}

impl MessengerError {
    /// HTTP status an inbound request should be answered with when the
    /// bridge call it triggered fails.
    pub fn status(&self) -> http::StatusCode {
        match self {
            MessengerError::Validation(_) => http::StatusCode::BAD_REQUEST,
            MessengerError::Protocol { .. } | MessengerError::Transport { .. } => {
                http::StatusCode::BAD_GATEWAY
            }
            MessengerError::Conversion(_) | MessengerError::Encode(_) => {
                http::StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Network-level failures of a single request.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection refused by {addr}")]
    ConnectionRefused { addr: String },

    #[error("connecting to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("http handshake with {addr}: {source}")]
    Handshake {
        addr: String,
        #[source]
        source: hyper::Error,
    },

    #[error("request to {addr} failed: {source}")]
    Request {
        addr: String,
        #[source]
        source: hyper::Error,
    },

    #[error("request to {addr} timed out after {after:?}")]
    Timeout { addr: String, after: Duration },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// Whether nothing was listening at the destination.
    pub fn is_connection_refused(&self) -> bool {
        matches!(self, TransportError::ConnectionRefused { .. })
    }
}
