//! Error types for API clients

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request {index}: response field '{field}' does not echo the request (sent {expected}, got {actual})")]
    EchoMismatch {
        index: usize,
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Response is missing field: {0}")]
    MissingField(String),

    #[error("Auth service configuration: {0}")]
    AuthConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Common(#[from] cedar_qa_common::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;
