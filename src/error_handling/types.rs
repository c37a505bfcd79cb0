//! Error type definitions.
//!
//! This module defines the error types returned by the library and the error
//! categories counted while processing jobs.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Error types for database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Stored broken-link list could not be encoded or decoded.
    #[error("Broken link serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Stored status value is not one of the known states.
    #[error("Unknown analysis status in database: {0}")]
    InvalidStatus(String),
}

/// Errors returned when a URL is submitted for analysis.
#[derive(Error, Debug)]
pub enum SubmitError {
    /// The URL was empty after trimming whitespace.
    #[error("URL cannot be empty or just whitespace")]
    EmptyUrl,

    /// The URL is not an absolute http(s) URL or exceeds the length limit.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The job queue has been closed (service shutting down).
    #[error("Job queue is closed")]
    QueueClosed,

    /// The job queue is at capacity (only from non-blocking submission).
    #[error("Job queue is full")]
    QueueFull,

    /// The record could not be written.
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Errors returned when looking up a record by identifier.
///
/// "Not found" is a distinct outcome from a storage failure.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("URL analysis {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Types of errors that can occur while fetching a page.
///
/// Used to build the descriptive error message recorded for a failed fetch
/// and to count failures in `ProcessingStats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    // HTTP/Network errors
    HttpRequestBuilderError,
    HttpRequestRedirectError,
    HttpRequestStatusError,
    HttpRequestTimeoutError,
    HttpRequestRequestError,
    HttpRequestConnectError,
    HttpRequestBodyError,
    HttpRequestDecodeError,
    HttpRequestOtherError,
    // Specific HTTP status code errors
    HttpRequestNotFound,            // 404 Not Found
    HttpRequestForbidden,           // 403 Forbidden
    HttpRequestInternalServerError, // 500 Internal Server Error
    // Pipeline errors
    StorageReadError,
    StorageWriteError,
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::HttpRequestBuilderError => "HTTP request builder error",
            ErrorType::HttpRequestRedirectError => "HTTP request redirect error",
            ErrorType::HttpRequestStatusError => "HTTP request status error",
            ErrorType::HttpRequestTimeoutError => "HTTP request timeout error",
            ErrorType::HttpRequestRequestError => "HTTP request error",
            ErrorType::HttpRequestConnectError => "HTTP request connect error",
            ErrorType::HttpRequestBodyError => "HTTP request body error",
            ErrorType::HttpRequestDecodeError => "HTTP request decode error",
            ErrorType::HttpRequestOtherError => "HTTP request other error",
            ErrorType::HttpRequestNotFound => "Not Found (404)",
            ErrorType::HttpRequestForbidden => "Forbidden (403)",
            ErrorType::HttpRequestInternalServerError => "Internal Server Error (500)",
            ErrorType::StorageReadError => "Storage read error",
            ErrorType::StorageWriteError => "Storage write error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_error_type_as_str() {
        assert_eq!(
            ErrorType::HttpRequestTimeoutError.as_str(),
            "HTTP request timeout error"
        );
        assert_eq!(ErrorType::HttpRequestNotFound.as_str(), "Not Found (404)");
        assert_eq!(
            ErrorType::StorageWriteError.to_string(),
            "Storage write error"
        );
    }

    #[test]
    fn test_all_error_types_have_string_representation() {
        for error_type in ErrorType::iter() {
            assert!(
                !error_type.as_str().is_empty(),
                "{:?} should have non-empty string",
                error_type
            );
        }
    }

    #[test]
    fn test_lookup_error_distinguishes_not_found() {
        let not_found = LookupError::NotFound(7);
        assert_eq!(not_found.to_string(), "URL analysis 7 not found");

        let storage = LookupError::from(DatabaseError::InvalidStatus("paused".into()));
        assert!(matches!(storage, LookupError::Database(_)));
    }

    #[test]
    fn test_submit_error_messages() {
        assert_eq!(
            SubmitError::EmptyUrl.to_string(),
            "URL cannot be empty or just whitespace"
        );
        assert_eq!(
            SubmitError::InvalidUrl("nope".into()).to_string(),
            "Invalid URL: nope"
        );
    }
}
