//! Engine error types

use thiserror::Error;

/// Failure fetching from an upstream read-only source (feed, roster).
///
/// All variants are transient: the current cycle's contribution is
/// skipped and the next scheduled cycle starts clean.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network-level failure (connect, timeout, body read)
    #[error("transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-success status
    #[error("upstream returned status {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// Body was empty, unparseable, or missing an expected field
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Failure talking to the guild platform.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The platform refused a role mutation
    #[error("permission denied")]
    PermissionDenied,

    /// Anything else (network, status, decode)
    #[error("gateway error: {0}")]
    Transport(String),
}

/// Failure delivering to a notification channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Timeout-class failure, eligible for bounded retry on the
    /// secondary channel
    #[error("delivery timed out")]
    Timeout,

    /// Any other delivery failure, never retried
    #[error("delivery failed: {0}")]
    Send(String),
}

/// Top-level engine error.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Feed or roster fetch failed
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Guild platform call failed
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
