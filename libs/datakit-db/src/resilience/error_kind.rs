use std::fmt;

use serde::{Deserialize, Serialize};

use crate::store::{StoreError, StoreErrorCode};

/// Caller-facing failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Timeout,
    Connection,
    Duplicate,
    ForeignKey,
    NotFound,
    Validation,
    Unauthorized,
    Forbidden,
    Conflict,
    CircuitOpen,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::Connection => "connection",
            ErrorKind::Duplicate => "duplicate",
            ErrorKind::ForeignKey => "foreign-key",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Validation => "validation",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Conflict => "conflict",
            ErrorKind::CircuitOpen => "circuit-open",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Generic description, safe to show to callers.
    #[must_use]
    pub fn default_message(self) -> &'static str {
        match self {
            ErrorKind::Timeout => "the operation timed out",
            ErrorKind::Connection => "the data store is unavailable",
            ErrorKind::Duplicate => "a record with the same unique value already exists",
            ErrorKind::ForeignKey => "a referenced record does not exist",
            ErrorKind::NotFound => "the record was not found",
            ErrorKind::Validation => "the request contains invalid data",
            ErrorKind::Unauthorized => "authentication is required",
            ErrorKind::Forbidden => "access to the resource is not allowed",
            ErrorKind::Conflict => "the operation conflicted with a concurrent change",
            ErrorKind::CircuitOpen => "the data store is temporarily disabled after repeated failures",
            ErrorKind::Unknown => "an unexpected error occurred",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: ErrorKind,
    pub retryable: bool,
}

/// Map a structured store code to a kind and retryability.
///
/// Retryable: timeouts, connectivity and transient contention (lock timeout,
/// deadlock, serialization failure). Everything else is terminal.
#[must_use]
pub fn classify(err: &StoreError) -> Classification {
    let (kind, retryable) = match err.code {
        StoreErrorCode::Timeout => (ErrorKind::Timeout, true),
        StoreErrorCode::Connection | StoreErrorCode::Network => (ErrorKind::Connection, true),
        StoreErrorCode::LockTimeout
        | StoreErrorCode::Deadlock
        | StoreErrorCode::SerializationFailure => (ErrorKind::Conflict, true),
        StoreErrorCode::UniqueViolation => (ErrorKind::Duplicate, false),
        StoreErrorCode::ForeignKeyViolation => (ErrorKind::ForeignKey, false),
        StoreErrorCode::NotFound => (ErrorKind::NotFound, false),
        StoreErrorCode::InvalidInput => (ErrorKind::Validation, false),
        StoreErrorCode::PermissionDenied => (ErrorKind::Forbidden, false),
        StoreErrorCode::Unauthenticated => (ErrorKind::Unauthorized, false),
        StoreErrorCode::Other => (ErrorKind::Unknown, false),
    };
    Classification { kind, retryable }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn transient_codes_are_retryable() {
        for code in [
            StoreErrorCode::Timeout,
            StoreErrorCode::Connection,
            StoreErrorCode::Network,
            StoreErrorCode::LockTimeout,
            StoreErrorCode::Deadlock,
            StoreErrorCode::SerializationFailure,
        ] {
            assert!(classify(&StoreError::new(code, "x")).retryable, "{code}");
        }
    }

    #[test]
    fn constraint_violations_are_terminal() {
        let c = classify(&StoreError::unique_violation("dup"));
        assert_eq!(c.kind, ErrorKind::Duplicate);
        assert!(!c.retryable);

        let c = classify(&StoreError::new(StoreErrorCode::ForeignKeyViolation, "fk"));
        assert_eq!(c.kind, ErrorKind::ForeignKey);
        assert!(!c.retryable);
    }

    #[test]
    fn kind_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_value(ErrorKind::CircuitOpen).unwrap(),
            serde_json::json!("circuit-open")
        );
        assert_eq!(ErrorKind::ForeignKey.to_string(), "foreign-key");
    }
}
