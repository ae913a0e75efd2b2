//! Daemon error types

use thiserror::Error;

/// Daemon error types
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Client construction or request error
    #[error("Client error: {0}")]
    Client(#[from] sector_clients::ClientError),

    /// The platform connection hit an unrecoverable error
    #[error("Platform connection failed: {0}")]
    ConnectionFailed(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;
