//! Error types for Cedar QA

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the common Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the shared utility layers
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to load configuration from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("Configuration key not set: {0}")]
    MissingConfigKey(String),

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
