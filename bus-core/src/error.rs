//! Error types for bus utilities

use thiserror::Error;

/// Result type for bus operations
pub type Result<T> = std::result::Result<T, Error>;

/// Bus utility errors
#[derive(Debug, Error)]
pub enum Error {
    /// Message envelope could not be parsed or serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or empty configuration parameter
    #[error("Missing or empty {0} in configuration")]
    MissingParam(&'static str),

    /// Log filter could not be installed or reloaded
    #[error("Log filter error: {0}")]
    LogFilter(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
