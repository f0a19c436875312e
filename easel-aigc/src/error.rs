//! Error types for the upload and AIGC clients.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur when talking to the backend or the AIGC service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A base or upload URL is invalid.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed (connection, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// JSON parsing failed.
    #[error("failed to parse response payload: {0}")]
    Json(#[from] serde_json::Error),
    /// Reading a local file failed.
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
    /// The server answered with a non-success HTTP status.
    #[error("request failed with status: {status}")]
    Status {
        /// HTTP status returned by the server.
        status: StatusCode,
    },
    /// The server reported an application-level failure in its envelope.
    #[error("{message} (code {code})")]
    Rejected {
        /// Application code from the envelope.
        code: i64,
        /// Server message, suitable for showing to the user.
        message: String,
    },
    /// The response did not match the expected structure.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
    /// A generation request carried too many reference images.
    #[error("too many reference images: {count} (max {max})")]
    TooManyReferenceImages {
        /// Number of images supplied.
        count: usize,
        /// Maximum accepted.
        max: usize,
    },
    /// Polling gave up before the task reached a terminal status.
    #[error("task {prompt_id} not finished after {attempts} polls")]
    PollExhausted {
        /// Prompt being polled.
        prompt_id: String,
        /// Number of status requests issued.
        attempts: u32,
    },
    /// Polling was cancelled by the caller.
    #[error("polling cancelled")]
    Cancelled,
    /// A spawned poll task panicked or was aborted.
    #[error("poll task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl ClientError {
    /// Returns true if this error is a transport failure a caller may re-attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_))
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status } => Some(*status),
            Self::Http(err) => err.status(),
            _ => None,
        }
    }
}
