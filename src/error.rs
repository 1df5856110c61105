//! Error taxonomy shared by the store, query, and mutation layers.

use std::fmt;

use rusqlite::ffi;
use rusqlite::{Error as SqlError, ErrorCode};
use thiserror::Error;
use tracing::warn;

/// User-facing text for a foreign-key failure caught by SQLite itself.
const CONSTRAINT_INTEGRITY_MESSAGE: &str =
    "The record refers to a venue or artist that does not exist.";
/// User-facing text for a not-null or check failure caught by SQLite itself.
const CONSTRAINT_VALIDATION_MESSAGE: &str = "A required field is missing or invalid.";

/// Which table a record lives in. Used in not-found errors and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Venue,
    Artist,
    Show,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Venue => "Venue",
            EntityKind::Artist => "Artist",
            EntityKind::Show => "Show",
        };
        f.write_str(label)
    }
}

/// Coarse classification of a [`StoreError`]. Mutation outcomes carry this so
/// callers can tell a validation failure apart from an integrity failure
/// without matching on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Integrity,
    Transient,
}

#[derive(Error, Debug)]
pub enum StoreError {
    /// A required field is missing or blank, or a value is malformed.
    #[error("{0}")]
    Validation(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },

    /// A reference does not resolve, or a delete is blocked by owned shows.
    #[error("{0}")]
    Integrity(String),

    #[error("store failure: {0}")]
    Transient(#[source] SqlError),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Validation(_) => ErrorKind::Validation,
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Integrity(_) => ErrorKind::Integrity,
            StoreError::Transient(_) => ErrorKind::Transient,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    pub(crate) fn integrity(message: impl Into<String>) -> Self {
        StoreError::Integrity(message.into())
    }

    pub(crate) fn not_found(kind: EntityKind, id: i64) -> Self {
        StoreError::NotFound { kind, id }
    }
}

/// Constraint failures that slip past the explicit checks still land in the
/// right bucket: foreign keys are integrity problems, not-null and check
/// constraints are validation problems. SQLite's own wording goes to the log;
/// the error carries a fixed message.
impl From<SqlError> for StoreError {
    fn from(err: SqlError) -> Self {
        if let SqlError::SqliteFailure(failure, detail) = &err {
            if failure.code == ErrorCode::ConstraintViolation {
                let detail = detail.as_deref().unwrap_or("no detail");
                return match failure.extended_code {
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY | ffi::SQLITE_CONSTRAINT_TRIGGER => {
                        warn!(detail, "foreign key constraint failed");
                        StoreError::integrity(CONSTRAINT_INTEGRITY_MESSAGE)
                    }
                    ffi::SQLITE_CONSTRAINT_NOTNULL | ffi::SQLITE_CONSTRAINT_CHECK => {
                        warn!(detail, "column constraint failed");
                        StoreError::validation(CONSTRAINT_VALIDATION_MESSAGE)
                    }
                    _ => StoreError::Transient(err),
                };
            }
        }
        StoreError::Transient(err)
    }
}
