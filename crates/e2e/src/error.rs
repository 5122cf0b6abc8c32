//! Error types for E2E testing

use std::path::PathBuf;
use thiserror::Error;

use crate::autocomplete::AttemptFailure;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Element not found with locator: {selector}")]
    ElementNotFound { selector: String },

    #[error("Timed out {timeout_ms}ms waiting for element with locator \"{selector}\"")]
    ElementWaitTimeout { selector: String, timeout_ms: u64 },

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to set autocomplete {selector} to '{expected}' after {attempts} attempt(s): {failure} (last value: '{last_observed}')")]
    AutocompleteSelection {
        selector: String,
        expected: String,
        attempts: u32,
        last_observed: String,
        failure: AttemptFailure,
    },

    #[error("No dropdown option found for: {target}")]
    DropdownNotFound { target: String },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Playwright not found. Install with: npm i playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Test spec parse error: {0}")]
    SpecParse(String),

    #[error("Unknown selector reference: {0}")]
    UnknownSelector(String),

    #[error(transparent)]
    Common(#[from] cedar_qa_common::Error),

    #[error("Auth service error: {0}")]
    Api(#[from] cedar_qa_api::ApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;
