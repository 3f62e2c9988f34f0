//! Error types for the task API client and the task form.

use reqwest::StatusCode;
use thiserror::Error;

/// A call to the task API failed.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, timeout or other transport failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The response body did not match the expected shape.
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Form input rejected before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("due date must be YYYY-MM-DD, got {0:?}")]
    InvalidDate(String),
}
