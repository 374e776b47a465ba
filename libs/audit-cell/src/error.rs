// libs/audit-cell/src/error.rs
use thiserror::Error;

use crate::snapshot::SnapshotError;

/// Failures of the recorder itself. These are operator-facing: the primary
/// operation that triggered the entry has already committed and is never
/// rolled back or failed because of them.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Audit log entry not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for AuditError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AuditError::NotFound,
            other => AuditError::Database(other.to_string()),
        }
    }
}

/// Failures of a restoration attempt. One attempt per call; every variant
/// means the transaction was rolled back in full.
#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("Audit log entry not found: {0}")]
    NotFound(String),

    #[error("Restore rejected: {0}")]
    InvalidState(String),

    #[error("Entity already restored: {0}")]
    AlreadyRestored(String),

    #[error("Restore violated a storage constraint: {0}")]
    ConstraintViolation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<SnapshotError> for RestoreError {
    fn from(e: SnapshotError) -> Self {
        RestoreError::InvalidState(e.to_string())
    }
}

impl RestoreError {
    /// Map a storage failure, surfacing unique-constraint violations as their
    /// own variant so callers can tell "duplicate row" from "store down".
    pub fn from_db(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return RestoreError::ConstraintViolation(db_err.to_string());
            }
        }
        RestoreError::Database(e.to_string())
    }
}
