//! Domain-specific error types using `thiserror`.
//!
//! This module defines the main error enums for the two domains of the
//! catalogue core: the persistent record cache and the sync cycle.

use std::result::Result as StdResult;

use {anyhow::Error, sqlx::Error as SqlxError, thiserror::Error};

use crate::library::schema::SchemaError;

/// Record cache errors.
#[derive(Error, Debug)]
pub enum LibraryError {
    /// Database connection or query error.
    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),
    /// Schema initialization error.
    #[error("Schema error: {0}")]
    SchemaError(#[from] SchemaError),
    /// Invalid file path or metadata.
    #[error("Invalid data: {reason}")]
    InvalidData { reason: String },
}

/// Errors that abort a whole sync cycle.
///
/// Per-file extraction failures never show up here; they are logged and the
/// file is dropped from the cycle's result set.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The media index denied access to the library storage.
    #[error("Access denied: {reason}")]
    AccessDenied { reason: String },
    /// The media index could not be queried for another reason.
    #[error("Media index error: {reason}")]
    MediaIndex { reason: String },
    /// Reading or writing the record cache failed.
    #[error("Cache error: {0}")]
    Cache(#[from] LibraryError),
    /// A background extraction task panicked or was aborted.
    #[error("Extraction task failed: {reason}")]
    TaskFailed { reason: String },
    /// The cycle was abandoned before publishing.
    #[error("Sync cancelled")]
    Cancelled,
}

impl SyncError {
    /// Whether the failure means the library cannot be reached at all.
    #[must_use]
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }
}

/// Operational error context propagation with `anyhow`.
///
/// This type is used for operational errors that need rich context
/// but don't require specific handling logic.
pub type Result<T> = StdResult<T, Error>;
