//! Cedar QA Common Library
//!
//! Shared building blocks for the API and UI suites: configuration loading,
//! random test data, the file logger and the domain types they exchange.

pub mod config;
pub mod datagen;
pub mod error;
pub mod logger;
pub mod types;

// Re-export commonly used types
pub use config::{read_configuration, Configuration};
pub use error::{Error, Result};
pub use logger::{FileLogger, LogLevel, LoggerRegistry};
pub use types::*;

/// Cedar QA version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
