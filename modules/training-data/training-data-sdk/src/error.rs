use datakit_db::{ErrorKind, OperationFailure};
use serde::Serialize;
use uuid::Uuid;

/// Error returned by every `TrainingDataApi` method.
///
/// `message` is safe to show to callers; it never carries raw store text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct DataError {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl DataError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: false,
        }
    }

    #[must_use]
    pub fn not_found(entity: &str, id: Uuid) -> Self {
        Self::new(ErrorKind::NotFound, format!("{entity} {id} not found"))
    }

    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

impl From<OperationFailure> for DataError {
    fn from(failure: OperationFailure) -> Self {
        Self {
            kind: failure.kind,
            message: failure.message,
            retryable: failure.retryable,
        }
    }
}
