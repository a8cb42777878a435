use std::fmt;

use serde::{Deserialize, Serialize};

/// Structured failure reason reported by a [`Store`](super::Store).
///
/// Adapters derive the code from driver error variants and SQLSTATE / `SQLite`
/// result codes. Message text is never inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreErrorCode {
    Timeout,
    Connection,
    Network,
    LockTimeout,
    Deadlock,
    SerializationFailure,
    UniqueViolation,
    ForeignKeyViolation,
    NotFound,
    InvalidInput,
    PermissionDenied,
    Unauthenticated,
    Other,
}

impl StoreErrorCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StoreErrorCode::Timeout => "timeout",
            StoreErrorCode::Connection => "connection",
            StoreErrorCode::Network => "network",
            StoreErrorCode::LockTimeout => "lock-timeout",
            StoreErrorCode::Deadlock => "deadlock",
            StoreErrorCode::SerializationFailure => "serialization-failure",
            StoreErrorCode::UniqueViolation => "unique-violation",
            StoreErrorCode::ForeignKeyViolation => "foreign-key-violation",
            StoreErrorCode::NotFound => "not-found",
            StoreErrorCode::InvalidInput => "invalid-input",
            StoreErrorCode::PermissionDenied => "permission-denied",
            StoreErrorCode::Unauthenticated => "unauthenticated",
            StoreErrorCode::Other => "other",
        }
    }

    /// Map a `PostgreSQL` SQLSTATE.
    #[must_use]
    pub fn from_sqlstate(state: &str) -> Self {
        match state {
            "23505" => StoreErrorCode::UniqueViolation,
            "23503" => StoreErrorCode::ForeignKeyViolation,
            "23502" | "23514" => StoreErrorCode::InvalidInput,
            "40P01" => StoreErrorCode::Deadlock,
            "40001" => StoreErrorCode::SerializationFailure,
            "55P03" => StoreErrorCode::LockTimeout,
            "57014" => StoreErrorCode::Timeout,
            "42501" => StoreErrorCode::PermissionDenied,
            s if s.starts_with("08") => StoreErrorCode::Connection,
            s if s.starts_with("22") => StoreErrorCode::InvalidInput,
            s if s.starts_with("28") => StoreErrorCode::Unauthenticated,
            _ => StoreErrorCode::Other,
        }
    }

    /// Map a `SQLite` (extended) result code.
    #[must_use]
    pub fn from_sqlite_code(code: i32) -> Self {
        match code {
            // SQLITE_CONSTRAINT_UNIQUE, SQLITE_CONSTRAINT_PRIMARYKEY
            2067 | 1555 => StoreErrorCode::UniqueViolation,
            // SQLITE_CONSTRAINT_FOREIGNKEY
            787 => StoreErrorCode::ForeignKeyViolation,
            // SQLITE_CONSTRAINT_NOTNULL, SQLITE_CONSTRAINT_CHECK, SQLITE_MISMATCH
            1299 | 275 | 20 => StoreErrorCode::InvalidInput,
            _ => match code & 0xff {
                // SQLITE_BUSY, SQLITE_LOCKED
                5 | 6 => StoreErrorCode::LockTimeout,
                // SQLITE_IOERR, SQLITE_CANTOPEN
                10 | 14 => StoreErrorCode::Connection,
                // SQLITE_INTERRUPT
                9 => StoreErrorCode::Timeout,
                // SQLITE_PERM, SQLITE_READONLY, SQLITE_AUTH
                3 | 8 | 23 => StoreErrorCode::PermissionDenied,
                // SQLITE_CONSTRAINT
                19 => StoreErrorCode::InvalidInput,
                _ => StoreErrorCode::Other,
            },
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw failure surfaced by a store adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct StoreError {
    pub code: StoreErrorCode,
    pub message: String,
}

impl StoreError {
    #[must_use]
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Timeout, message)
    }

    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Connection, message)
    }

    #[must_use]
    pub fn unique_violation(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::UniqueViolation, message)
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::NotFound, message)
    }

    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::InvalidInput, message)
    }

    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::Other, message)
    }
}
