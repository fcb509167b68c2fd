//! Error types for the lifecycle runner

use std::time::Duration;
use thiserror::Error;

/// Why a single attempt did not pass.
///
/// Everything except `Infrastructure` is eligible for a retry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttemptFailure {
    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("Element not found: {what} (waited {}s)", .waited.as_secs())]
    ElementNotFound { what: String, waited: Duration },

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    #[error("Attempt timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Infrastructure failure: {0}")]
    Infrastructure(String),
}

impl AttemptFailure {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, AttemptFailure::Infrastructure(_))
    }

    pub fn element_not_found(what: impl Into<String>, waited: Duration) -> Self {
        AttemptFailure::ElementNotFound {
            what: what.into(),
            waited,
        }
    }
}

/// Fail the attempt with an assertion failure unless `condition` holds
pub fn ensure(condition: bool, message: impl Into<String>) -> Result<(), AttemptFailure> {
    if condition {
        Ok(())
    } else {
        Err(AttemptFailure::Assertion(message.into()))
    }
}

/// Errors raised by the browser collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Screenshot failed: {0}")]
    Screenshot(String),

    #[error("Session close failed: {0}")]
    Close(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Browser error: {0}")]
    Other(String),
}

/// Suite-level errors
#[derive(Error, Debug)]
pub enum E2eError {
    #[error(transparent)]
    Common(#[from] insights_common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Test registered twice: {0}")]
    DuplicateTest(String),

    #[error("Case catalogue error: {0}")]
    CaseCatalogue(String),

    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl From<tempfile::PersistError> for E2eError {
    fn from(e: tempfile::PersistError) -> Self {
        E2eError::Io(e.error)
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
