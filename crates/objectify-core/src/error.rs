//! Error types module
//!
//! This module provides the core error types used throughout Objectify.
//! Key handling, event signing, input decoding and settings persistence all
//! report failures through the `AppError` enum. The upload pipeline wraps
//! these in its own error type and reports them through the same
//! `ErrorMetadata` trait.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like malformed user input
    Debug,
    /// Warning level - for remote rejections and transient failures
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be reported to the user.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "MALFORMED_INPUT")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same operation may succeed
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// User-facing message
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedInput(format!("JSON parsing error: {}", err))
    }
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        AppError::MalformedInput(_) => (
            "MALFORMED_INPUT",
            false,
            Some("Check the input encoding and try again"),
            LogLevel::Debug,
        ),
        AppError::InvalidKey(_) => (
            "INVALID_KEY",
            false,
            Some("Provide a 64 character hex secret key"),
            LogLevel::Debug,
        ),
        AppError::Signing(_) => ("SIGNING_ERROR", false, None, LogLevel::Error),
        AppError::InvalidEvent(_) => (
            "INVALID_EVENT",
            false,
            Some("Verify the event was signed by its author"),
            LogLevel::Warn,
        ),
        AppError::NotFound(_) => (
            "NOT_FOUND",
            false,
            Some("Verify the identifier exists"),
            LogLevel::Debug,
        ),
        AppError::Config(_) => (
            "CONFIGURATION_ERROR",
            false,
            Some("Check environment variables and settings file"),
            LogLevel::Warn,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Signing(_) => "Failed to sign the request".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal error".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_malformed_input() {
        let err = AppError::MalformedInput("missing ','".to_string());
        assert_eq!(err.error_code(), "MALFORMED_INPUT");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "Malformed input: missing ','");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_signing_hides_details() {
        let err = AppError::Signing("self-verification failed".to_string());
        assert_eq!(err.error_code(), "SIGNING_ERROR");
        assert_eq!(err.client_message(), "Failed to sign the request");
        assert_eq!(err.suggested_action(), None);
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_detailed_message_includes_source_chain() {
        let err = AppError::from(anyhow::anyhow!("disk full").context("saving settings"));
        let details = err.detailed_message();
        assert!(details.starts_with("Internal error with source"));
        assert!(details.contains("Caused by: saving settings"));
    }

    #[test]
    fn test_json_errors_are_malformed_input() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = AppError::from(parse);
        assert_eq!(err.error_code(), "MALFORMED_INPUT");
    }
}
