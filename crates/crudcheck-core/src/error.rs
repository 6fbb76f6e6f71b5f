//! Error types for the harness
//!
//! Two classes are kept strictly apart: assertion mismatches, where the system
//! under test answered but answered wrongly, and infrastructure failures, where
//! the harness could not obtain an answer at all.

use thiserror::Error;

/// Infrastructure failures (connection refused, SQL errors, malformed responses)
#[derive(Debug, Error)]
pub enum HarnessError {
    /// HTTP client error
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The response could not be interpreted
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A step referenced scenario state that no earlier step produced
    #[error("Missing scenario state: {0}")]
    MissingState(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The sequence definition itself is unusable
    #[error("Invalid sequence: {0}")]
    InvalidSequence(String),
}

/// An observed value did not match the expected one
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssertionFailure {
    /// Generic expected/actual mismatch
    #[error("{subject}: expected {expected}, got {actual}")]
    Mismatch {
        subject: String,
        expected: String,
        actual: String,
    },

    /// A row that should exist was not found
    #[error("Item must exist in DB (id {id})")]
    RowMissing { id: i64 },

    /// A row that should be gone is still there
    #[error("Item should no longer exist in DB (id {id})")]
    RowStillPresent { id: i64 },

    /// The observation is not a legal lifecycle transition
    #[error("Lifecycle violation for '{key}': cannot observe {observation} while {state}")]
    Lifecycle {
        key: String,
        state: String,
        observation: String,
    },
}

impl AssertionFailure {
    /// Shorthand for a mismatch with displayable values
    pub fn mismatch(
        subject: impl Into<String>,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        Self::Mismatch {
            subject: subject.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

/// Why a single step did not pass
#[derive(Debug, Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(#[from] AssertionFailure),

    #[error("infrastructure failure: {0}")]
    Infrastructure(#[from] HarnessError),
}

impl StepError {
    /// Whether this is an infrastructure failure rather than a mismatch
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, StepError::Infrastructure(_))
    }
}

/// Result type for harness plumbing
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Result type for a step body
pub type StepResult<T> = Result<T, StepError>;
