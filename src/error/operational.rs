//! Operational error context propagation with `anyhow`.
//!
//! This module provides extension traits and utilities for enhancing
//! error context and centralized error reporting.

use std::{error::Error as StdError, fmt::Display};

use {
    anyhow::{Context, Error, Result as AnyhowResult},
    tracing::{debug, error, info, warn},
};

use crate::error::domain::SyncError;

/// Extension trait for enhanced error context.
///
/// This trait provides methods to add contextual information to errors,
/// making debugging and user feedback more informative.
pub trait ResultExt<T, E> {
    /// Adds context to an error with a static string.
    fn add_context(self, context: &'static str) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static;

    /// Adds context to an error with a formatted string.
    fn add_contextf(self, format: impl Display) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn add_context(self, context: &'static str) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static,
    {
        self.context(context)
    }

    fn add_contextf(self, format: impl Display) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static,
    {
        self.context(format.to_string())
    }
}

/// Centralized error reporting and logging.
///
/// The `ErrorReporter` provides a consistent interface for logging
/// errors at different severity levels and reporting them to users.
pub struct ErrorReporter;

impl ErrorReporter {
    /// Reports a debug-level error (development only).
    pub fn debug(error: &Error, context: &str) {
        debug!(context = context, error = %error, "Debug error");
    }

    /// Reports an info-level error (user actions and system events).
    pub fn info(error: &Error, context: &str) {
        info!(context = context, error = %error, "Info error");
    }

    /// Reports a warning-level error (recoverable issues).
    pub fn warn(error: &Error, context: &str) {
        warn!(context = context, error = %error, "Warning error");
    }

    /// Reports an error-level error (non-recoverable issues).
    pub fn error(error: &Error, context: &str) {
        error!(context = context, error = %error, "Error error");
    }

    /// Converts an error to a user-friendly message.
    ///
    /// Sync failures anywhere in the chain get a fixed message; everything
    /// else falls back to the top-level error message.
    pub fn to_user_message(error: &Error) -> String {
        match error.chain().find_map(|cause| cause.downcast_ref::<SyncError>()) {
            Some(SyncError::AccessDenied { .. }) => {
                "No access to the music folders. Grant storage access and sync again.".to_string()
            }
            Some(SyncError::Cancelled) => "Sync was cancelled.".to_string(),
            _ => error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        error::Error,
        fmt::{Display, Formatter, Result as FmtResult},
    };

    use anyhow::anyhow;

    use crate::error::{
        domain::SyncError,
        operational::{ErrorReporter, ResultExt},
    };

    #[derive(Debug)]
    struct TestError;

    impl Display for TestError {
        fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
            write!(f, "Test error")
        }
    }

    impl Error for TestError {}

    #[test]
    fn test_result_ext_with_context() {
        let result: Result<i32, TestError> = Err(TestError);
        let error = result.add_context("Additional context").unwrap_err();
        assert!(error.to_string().contains("Additional context"));
    }

    #[test]
    fn test_result_ext_with_contextf() {
        let result: Result<i32, TestError> = Err(TestError);
        let error = result.add_contextf(format!("Syncing {}", "Music")).unwrap_err();
        assert!(error.to_string().contains("Syncing Music"));
    }

    #[test]
    fn test_error_reporter_user_message() {
        let error = anyhow!("Test error message");
        assert_eq!(ErrorReporter::to_user_message(&error), "Test error message");
    }

    #[test]
    fn test_error_reporter_access_denied_message() {
        let result: Result<(), SyncError> = Err(SyncError::AccessDenied {
            reason: "Music".to_string(),
        });
        let error = result.add_context("Initial sync failed").unwrap_err();
        assert!(ErrorReporter::to_user_message(&error).starts_with("No access"));
    }
}
