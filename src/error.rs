//! Error types for Frostchain

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ChainError {
    /// Malformed or truncated wire bytes. Fatal to the decode call only.
    #[error("decode error: {0}")]
    Decode(String),

    /// Content hash mismatch on load. The record must be rejected.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// A referenced block, transaction, or output cannot be found.
    /// Recoverable: the caller may retry once the data is available.
    #[error("resolution error: {0}")]
    Resolution(String),

    /// A block or transaction fails a consensus rule. The ledger is unchanged.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),

    /// Storage or crypto provider misconfigured. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<rusqlite::Error> for ChainError {
    fn from(err: rusqlite::Error) -> Self {
        ChainError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::Storage(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
