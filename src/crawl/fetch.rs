//! Page retrieval.
//!
//! Fetches the submitted page with the shared page client. Both transport
//! failures and HTTP error statuses are reported as a fetch error; an error
//! status still yields its body so the page can be analysed. Bodies are cut
//! at `MAX_RESPONSE_BODY_SIZE`; the kept prefix is analysed as the page.

use log::debug;
use reqwest::header::{HeaderValue, ACCEPT, ACCEPT_LANGUAGE};

use crate::config::MAX_RESPONSE_BODY_SIZE;
use crate::error_handling::{categorize_status, describe_status, describe_transport_error};
use crate::error_handling::ProcessingStats;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Result of fetching the analysed page.
#[derive(Debug, Default)]
pub struct FetchedPage {
    /// URL after following redirects; the submitted URL on transport failure.
    pub final_url: String,
    /// Response body, empty when no response was received.
    pub body: String,
    /// Description of the failure, e.g. `"HTTP 404 Not Found"`.
    pub error: Option<String>,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Fetches `url`, never failing: problems are described in `FetchedPage::error`.
///
/// # Arguments
///
/// * `client` - The page client (timeouts and redirects preconfigured)
/// * `url` - The URL to fetch
/// * `stats` - Error counters updated for every failure
pub async fn fetch_page(client: &reqwest::Client, url: &str, stats: &ProcessingStats) -> FetchedPage {
    let response = client
        .get(url)
        .header(ACCEPT, HeaderValue::from_static(ACCEPT_HTML))
        .header(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"))
        .send()
        .await;

    let response = match response {
        Ok(response) => response,
        Err(e) => {
            let error = describe_transport_error(stats, &e);
            debug!("Fetch of {url} failed: {error}");
            return FetchedPage {
                final_url: url.to_string(),
                body: String::new(),
                error: Some(error),
            };
        }
    };

    let status = response.status();
    let final_url = response.url().to_string();
    let status_error = if status.as_u16() >= 400 {
        stats.increment_error(categorize_status(status));
        Some(describe_status(status))
    } else {
        None
    };

    match read_capped_body(response, MAX_RESPONSE_BODY_SIZE).await {
        Ok(body) => FetchedPage {
            final_url,
            body,
            error: status_error,
        },
        Err(e) => FetchedPage {
            final_url,
            body: String::new(),
            error: Some(status_error.unwrap_or_else(|| describe_transport_error(stats, &e))),
        },
    }
}

/// Reads at most `limit` bytes of the body chunk by chunk, dropping the rest.
async fn read_capped_body(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<String, reqwest::Error> {
    let mut buf: Vec<u8> = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = limit - buf.len();
        if chunk.len() >= room {
            buf.extend_from_slice(&chunk[..room]);
            debug!(
                "Body of {} truncated at {} bytes",
                response.url(),
                limit
            );
            break;
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::ErrorType;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_success_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let stats = ProcessingStats::new();
        let page = fetch_page(&reqwest::Client::new(), &server.uri(), &stats).await;

        assert!(page.is_success());
        assert_eq!(page.body, "<html></html>");
        assert_eq!(stats.total_errors(), 0);
    }

    #[tokio::test]
    async fn test_fetch_error_status_keeps_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<title>Gone</title>"))
            .mount(&server)
            .await;

        let stats = ProcessingStats::new();
        let page = fetch_page(&reqwest::Client::new(), &server.uri(), &stats).await;

        assert_eq!(page.error.as_deref(), Some("HTTP 404 Not Found"));
        assert_eq!(page.body, "<title>Gone</title>");
        assert_eq!(stats.get_error_count(ErrorType::HttpRequestNotFound), 1);
    }

    #[tokio::test]
    async fn test_fetch_follows_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(301).insert_header("location", format!("{}/new", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
            .mount(&server)
            .await;

        let stats = ProcessingStats::new();
        let url = format!("{}/old", server.uri());
        let page = fetch_page(&reqwest::Client::new(), &url, &stats).await;

        assert!(page.is_success());
        assert!(page.final_url.ends_with("/new"));
        assert_eq!(page.body, "moved");
    }

    #[tokio::test]
    async fn test_oversized_body_is_truncated() {
        let server = MockServer::start().await;
        let head = "<!DOCTYPE html><title>Big</title><h1>top</h1>";
        let body = format!("{head}{}", "x".repeat(MAX_RESPONSE_BODY_SIZE + 4096));
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let stats = ProcessingStats::new();
        let page = fetch_page(&reqwest::Client::new(), &server.uri(), &stats).await;

        assert!(page.is_success());
        assert_eq!(page.body.len(), MAX_RESPONSE_BODY_SIZE);
        assert!(page.body.starts_with(head));

        let base = url::Url::parse(&page.final_url).unwrap();
        let structure = crate::crawl::analyze_html(&page.body, &base);
        assert_eq!(structure.title, "Big");
        assert_eq!(structure.heading_counts[0], 1);
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let stats = ProcessingStats::new();
        let page = fetch_page(&client, "http://127.0.0.1:9/", &stats).await;

        assert!(!page.is_success());
        assert!(page.body.is_empty());
        assert_eq!(page.final_url, "http://127.0.0.1:9/");
        assert_eq!(stats.get_error_count(ErrorType::HttpRequestConnectError), 1);
    }
}
