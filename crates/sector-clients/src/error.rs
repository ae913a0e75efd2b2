//! Client error types

use sector_engine::SourceError;
use thiserror::Error;

/// HTTP client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response status
    #[error("upstream returned status {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// Credentials rejected by the upstream service
    #[error("unauthorized")]
    Unauthorized,

    /// Empty response body where content was required
    #[error("empty response body")]
    EmptyBody,

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field missing from an otherwise valid payload
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// Upstream reported an application-level error
    #[error("API error: {0}")]
    Api(String),

    /// No data available for the requested resource
    #[error("no data available")]
    NoData,
}

impl From<ClientError> for SourceError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http(e) => SourceError::Transport(e.to_string()),
            ClientError::Status { status } => SourceError::Status { status },
            ClientError::Unauthorized => SourceError::Status { status: 401 },
            other => SourceError::Malformed(other.to_string()),
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
