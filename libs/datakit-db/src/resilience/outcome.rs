use serde::Serialize;

use super::ErrorKind;

/// Normalized failure of one logical operation.
///
/// `message` is generic per kind; raw store text never reaches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
#[serde(rename_all = "camelCase")]
pub struct OperationFailure {
    pub kind: ErrorKind,
    pub message: String,
    pub attempts: u32,
    pub duration_ms: u64,
    pub retryable: bool,
}

impl OperationFailure {
    #[must_use]
    pub fn new(operation: &str, kind: ErrorKind, attempts: u32, duration_ms: u64, retryable: bool) -> Self {
        Self {
            kind,
            message: format!("{operation}: {}", kind.default_message()),
            attempts,
            duration_ms,
            retryable,
        }
    }
}

/// Uniform result of a wrapped operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum OperationOutcome<T> {
    #[serde(rename_all = "camelCase")]
    Success {
        data: T,
        attempts: u32,
        duration_ms: u64,
    },
    Failure(OperationFailure),
}

impl<T> OperationOutcome<T> {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Success { .. })
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            OperationOutcome::Success { attempts, .. } => *attempts,
            OperationOutcome::Failure(f) => f.attempts,
        }
    }

    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        match self {
            OperationOutcome::Success { duration_ms, .. } => *duration_ms,
            OperationOutcome::Failure(f) => f.duration_ms,
        }
    }

    /// # Errors
    /// Returns the failure when the operation did not succeed.
    pub fn into_result(self) -> Result<T, OperationFailure> {
        match self {
            OperationOutcome::Success { data, .. } => Ok(data),
            OperationOutcome::Failure(f) => Err(f),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> OperationOutcome<U> {
        match self {
            OperationOutcome::Success {
                data,
                attempts,
                duration_ms,
            } => OperationOutcome::Success {
                data: f(data),
                attempts,
                duration_ms,
            },
            OperationOutcome::Failure(failure) => OperationOutcome::Failure(failure),
        }
    }
}
