//! Submitted URL validation.

use log::warn;

use crate::config::MAX_URL_LENGTH;
use crate::error_handling::SubmitError;

/// Validates a submitted URL and returns the string to store.
///
/// The input is trimmed; the trimmed text (not a re-serialised form) is what
/// gets stored, so resubmitting the same text hits the same record.
///
/// # Errors
///
/// * `SubmitError::EmptyUrl` - nothing left after trimming
/// * `SubmitError::InvalidUrl` - longer than `MAX_URL_LENGTH`, unparsable,
///   not `http`/`https`, or without a host
pub fn validate_submitted_url(raw: &str) -> Result<String, SubmitError> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(SubmitError::EmptyUrl);
    }

    if url.len() > MAX_URL_LENGTH {
        warn!(
            "Rejecting URL exceeding maximum length ({} > {}): {}...",
            url.len(),
            MAX_URL_LENGTH,
            url.chars().take(50).collect::<String>()
        );
        return Err(SubmitError::InvalidUrl(format!(
            "URL exceeds maximum length of {MAX_URL_LENGTH} characters"
        )));
    }

    let parsed = url::Url::parse(url).map_err(|e| {
        warn!("Rejecting invalid URL {url}: {e}");
        SubmitError::InvalidUrl(format!("{url}: {e}"))
    })?;

    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some_and(|h| !h.is_empty()) => {
            Ok(url.to_string())
        }
        "http" | "https" => Err(SubmitError::InvalidUrl(format!("{url}: missing host"))),
        scheme => {
            warn!("Rejecting unsupported scheme for URL: {url}");
            Err(SubmitError::InvalidUrl(format!(
                "{url}: unsupported scheme '{scheme}'"
            )))
        }
    }
}
