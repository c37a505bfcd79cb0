//! Link reachability checking.
//!
//! Links are streamed through `buffer_unordered`, so at most `workers` probes
//! are in flight. The job's cancellation token is polled before each link is
//! taken: a cancelled job stops dispatching new probes while probes already in
//! flight run to their own timeout. `check` returns only after every
//! dispatched probe has finished.

use std::sync::Arc;

use futures::future;
use futures::stream::{self, StreamExt};
use log::debug;
use tokio_util::sync::CancellationToken;

use crate::storage::BrokenLink;

/// Aggregated result of one reachability check.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LinkCheckReport {
    /// Unordered; one entry per failed probe.
    pub broken_links: Vec<BrokenLink>,
    /// Always `broken_links.len()`.
    pub broken_count: usize,
}

/// Concurrent HEAD prober shared by every job.
#[derive(Clone)]
pub struct LinkChecker {
    client: Arc<reqwest::Client>,
    workers: usize,
}

impl LinkChecker {
    /// Creates a checker running at most `workers` probes at a time.
    ///
    /// The client's own timeout bounds each individual probe.
    pub fn new(client: Arc<reqwest::Client>, workers: usize) -> Self {
        Self {
            client,
            workers: workers.max(1),
        }
    }

    /// Probes every link in `links` and reports the broken ones.
    ///
    /// A link is broken when the probe fails outright (status code 0) or
    /// answers with a status of 400 or above. Nothing is retried.
    pub async fn check(&self, links: &[String], token: &CancellationToken) -> LinkCheckReport {
        if links.is_empty() {
            return LinkCheckReport::default();
        }

        let broken_links: Vec<BrokenLink> = stream::iter(links)
            .take_while(|_| future::ready(!token.is_cancelled()))
            .map(|link| probe(&self.client, link))
            .boxed()
            .buffer_unordered(self.workers)
            .filter_map(future::ready)
            .collect()
            .await;

        let broken_count = broken_links.len();
        LinkCheckReport {
            broken_links,
            broken_count,
        }
    }
}

/// Issues one HEAD request; `Some` when the link is broken.
async fn probe(client: &reqwest::Client, link: &str) -> Option<BrokenLink> {
    match client.head(link).send().await {
        Ok(response) => {
            let status = response.status();
            if status.as_u16() < 400 {
                debug!("Link {link} reachable ({status})");
                return None;
            }
            debug!("Link {link} broken ({status})");
            Some(BrokenLink {
                url: link.to_string(),
                status_code: status.as_u16(),
                error: status.canonical_reason().unwrap_or("Unknown Status").to_string(),
            })
        }
        Err(e) => {
            debug!("Link {link} unreachable: {e}");
            Some(BrokenLink {
                url: link.to_string(),
                status_code: 0,
                error: e.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn checker(workers: usize) -> LinkChecker {
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        LinkChecker::new(Arc::new(client), workers)
    }

    async fn mount_status(server: &MockServer, route: &str, status: u16) {
        Mock::given(method("HEAD"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_empty_input_returns_empty_report() {
        let report = checker(20).check(&[], &CancellationToken::new()).await;
        assert_eq!(report, LinkCheckReport::default());
    }

    #[tokio::test]
    async fn test_reports_only_failing_links() {
        let server = MockServer::start().await;
        mount_status(&server, "/ok", 200).await;
        mount_status(&server, "/missing", 404).await;
        mount_status(&server, "/boom", 500).await;

        let links: Vec<String> = ["/ok", "/missing", "/boom"]
            .iter()
            .map(|p| format!("{}{}", server.uri(), p))
            .collect();
        let report = checker(20).check(&links, &CancellationToken::new()).await;

        assert_eq!(report.broken_count, 2);
        assert_eq!(report.broken_links.len(), report.broken_count);
        let missing = report
            .broken_links
            .iter()
            .find(|b| b.url.ends_with("/missing"))
            .expect("404 link should be reported");
        assert_eq!(missing.status_code, 404);
        assert_eq!(missing.error, "Not Found");
        assert!(report.broken_links.iter().all(|b| b.status_code >= 400));
    }

    #[tokio::test]
    async fn test_connection_failure_is_status_zero() {
        let links = vec!["http://127.0.0.1:9/".to_string()];
        let report = checker(2).check(&links, &CancellationToken::new()).await;

        assert_eq!(report.broken_count, 1);
        assert_eq!(report.broken_links[0].status_code, 0);
        assert!(!report.broken_links[0].error.is_empty());
    }

    #[tokio::test]
    async fn test_probes_use_head() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(200))
            .expect(3)
            .mount(&server)
            .await;

        let links: Vec<String> = (0..3).map(|i| format!("{}/p{i}", server.uri())).collect();
        let report = checker(2).check(&links, &CancellationToken::new()).await;

        assert_eq!(report.broken_count, 0);
        server.verify().await;
    }

    #[tokio::test]
    async fn test_cancelled_token_dispatches_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404))
            .expect(0)
            .mount(&server)
            .await;

        let token = CancellationToken::new();
        token.cancel();
        let links: Vec<String> = (0..5).map(|i| format!("{}/p{i}", server.uri())).collect();
        let report = checker(3).check(&links, &token).await;

        assert_eq!(report.broken_count, 0);
        server.verify().await;
    }

    #[tokio::test]
    async fn test_cancellation_mid_check_stops_new_probes() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(404).set_delay(Duration::from_millis(300)))
            .mount(&server)
            .await;

        let token = CancellationToken::new();
        let links: Vec<String> = (0..10).map(|i| format!("{}/p{i}", server.uri())).collect();
        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        });

        let report = checker(1).check(&links, &token).await;

        // The single in-flight probe completes; none after it start.
        assert_eq!(report.broken_count, 1);
        let received = server.received_requests().await.unwrap_or_default();
        assert_eq!(received.len(), 1);
    }
}
