//! Protocol error types.

use thiserror::Error;

/// Result type alias for protocol operations.
pub type ProtoResult<T> = Result<T, ProtoError>;

/// Errors raised while parsing addresses or building protocol values.
#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("invalid process address {input:?}: {reason}")]
    InvalidAddress { input: String, reason: &'static str },

    #[error("converting master state to master info: {0}")]
    Conversion(String),

    #[error("encoding message: {0}")]
    Encode(#[from] serde_json::Error),
}
