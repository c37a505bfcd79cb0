// Shared helpers for the end-to-end tests: a running service on an ephemeral
// port backed by a temporary database file.

use std::time::Duration;

use page_analyzer::{run_server_on, Config};
use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A service instance running in the background.
pub struct TestService {
    pub base_url: String,
    pub client: reqwest::Client,
    cancel: CancellationToken,
    handle: JoinHandle<anyhow::Result<()>>,
    _db_dir: TempDir,
}

impl TestService {
    /// Starts the service with short timeouts suitable for tests.
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    pub async fn start_with(customize: impl FnOnce(&mut Config)) -> Self {
        let db_dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = Config {
            db_path: db_dir.path().join("analyses.db"),
            page_timeout_secs: 5,
            link_timeout_secs: 2,
            ..Default::default()
        };
        customize(&mut config);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_server_on(listener, config, cancel.clone()));

        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .expect("Failed to build test client");

        let service = TestService {
            base_url,
            client,
            cancel,
            handle,
            _db_dir: db_dir,
        };
        service.wait_until_ready().await;
        service
    }

    async fn wait_until_ready(&self) {
        for _ in 0..100 {
            if let Ok(response) = self.client.get(self.url("/ping")).send().await {
                if response.status().is_success() {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("service did not become ready");
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Submits `url` and returns the response body (expects 201).
    pub async fn submit(&self, url: &str) -> Value {
        let response = self
            .client
            .post(self.url("/urls"))
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await
            .expect("submit request failed");
        assert_eq!(response.status(), 201, "submission of {url} rejected");
        response.json().await.expect("submit response is JSON")
    }

    pub async fn get(&self, id: i64) -> Value {
        self.client
            .get(self.url(&format!("/urls/{id}")))
            .send()
            .await
            .expect("get request failed")
            .json()
            .await
            .expect("record is JSON")
    }

    pub async fn cancel(&self, id: i64) -> Value {
        self.client
            .post(self.url(&format!("/urls/{id}/cancel")))
            .send()
            .await
            .expect("cancel request failed")
            .json()
            .await
            .expect("cancel response is JSON")
    }

    /// Polls until the record reaches `status`, returning it.
    pub async fn wait_for_status(&self, id: i64, status: &str) -> Value {
        let mut last = Value::Null;
        for _ in 0..200 {
            last = self.get(id).await;
            if last["status"] == status {
                return last;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("record {id} never reached {status}; last seen: {last}");
    }

    /// Stops the API and the workers.
    pub async fn stop(self) {
        self.cancel.cancel();
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("service did not stop in time")
            .expect("service task panicked")
            .expect("service returned an error");
    }
}
