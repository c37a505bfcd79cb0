//! Error categorization.
//!
//! This module maps `reqwest` failures onto `ErrorType` and builds the
//! descriptive messages recorded for failed page fetches.

use reqwest::StatusCode;

use super::stats::ProcessingStats;
use super::types::ErrorType;

/// Categorizes a `reqwest::Error` into an `ErrorType`.
///
/// HTTP status codes are checked first, then the reqwest error kind.
pub fn categorize_reqwest_error(error: &reqwest::Error) -> ErrorType {
    if let Some(status) = error.status() {
        return categorize_status(status);
    }

    if error.is_builder() {
        ErrorType::HttpRequestBuilderError
    } else if error.is_redirect() {
        ErrorType::HttpRequestRedirectError
    } else if error.is_timeout() {
        ErrorType::HttpRequestTimeoutError
    } else if error.is_connect() {
        ErrorType::HttpRequestConnectError
    } else if error.is_request() {
        ErrorType::HttpRequestRequestError
    } else if error.is_body() {
        ErrorType::HttpRequestBodyError
    } else if error.is_decode() {
        ErrorType::HttpRequestDecodeError
    } else {
        ErrorType::HttpRequestOtherError
    }
}

/// Categorizes an HTTP error status (>= 400) into an `ErrorType`.
pub fn categorize_status(status: StatusCode) -> ErrorType {
    match status.as_u16() {
        403 => ErrorType::HttpRequestForbidden,
        404 => ErrorType::HttpRequestNotFound,
        500 => ErrorType::HttpRequestInternalServerError,
        _ => ErrorType::HttpRequestStatusError,
    }
}

/// Formats an HTTP status as `"HTTP 404 Not Found"`.
pub fn describe_status(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("HTTP {} {}", status.as_u16(), reason),
        None => format!("HTTP {}", status.as_u16()),
    }
}

/// Builds the message recorded for a transport-level failure and counts it.
pub fn describe_transport_error(stats: &ProcessingStats, error: &reqwest::Error) -> String {
    let error_type = categorize_reqwest_error(error);
    stats.increment_error(error_type);
    format!("{}: {}", error_type, error)
}
