//! Shared error types for the services crate.

use std::fmt;

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Failure of a call to the study API (content, quiz generation, recheck).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ApiError {
    #[error("study service unreachable: {0}")]
    Network(String),
    #[error("study service did not answer in time")]
    Timeout,
    #[error("study service responded with status {status}")]
    Server { status: u16 },
    #[error("study service returned an unusable payload: {0}")]
    Malformed(String),
}

/// Coarse classification used for user-facing text and recovery hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NetworkFailure,
    ServerError,
    MalformedResponse,
}

impl ApiError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            ApiError::Network(_) | ApiError::Timeout => FailureKind::NetworkFailure,
            ApiError::Server { .. } => FailureKind::ServerError,
            ApiError::Malformed(_) => FailureKind::MalformedResponse,
        }
    }

    /// True when repeating the same request may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(_) | ApiError::Timeout => true,
            ApiError::Server { status } => *status >= 500 || *status == 429,
            ApiError::Malformed(_) => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Server {
                status: status.as_u16(),
            }
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// A local precondition was not met; nothing was sent or changed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("Please select at least one topic")]
    NoTopicsSelected,
    #[error("{} question(s) still need an answer", missing.len())]
    Unanswered { missing: Vec<usize> },
}

/// Errors emitted by `QuizSession`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{action} is not allowed while the quiz is {phase}")]
    InvalidState {
        action: &'static str,
        phase: &'static str,
    },
    #[error("question index {index} is out of range for {len} question(s)")]
    AnswerOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// What the user should do after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    Retry,
    Reselect,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryAction::Retry => f.write_str("try again"),
            RecoveryAction::Reselect => f.write_str("go back and reselect your topics"),
        }
    }
}

/// User-facing description of a blocking failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFailure {
    pub kind: FailureKind,
    pub message: String,
    pub action: RecoveryAction,
}

impl SessionFailure {
    #[must_use]
    pub fn from_api(err: &ApiError) -> Self {
        let action = if err.is_transient() {
            RecoveryAction::Retry
        } else {
            RecoveryAction::Reselect
        };
        Self {
            kind: err.kind(),
            message: err.to_string(),
            action,
        }
    }
}

impl fmt::Display for SessionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.action)
    }
}

/// Errors emitted by `SessionHandoff`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HandoffError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("handoff payload is not valid: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
