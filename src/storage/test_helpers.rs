//! Shared test helpers for storage and pipeline tests.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::storage::models::{BrokenLink, PageMetrics};
use crate::storage::run_migrations;

/// Creates a test database pool with migrations applied.
/// Uses an in-memory database for fast test execution; a single connection
/// keeps concurrent workers from hitting shared-cache table locks.
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Metrics of a finished crawl with one broken link, for overwrite/reset tests.
pub fn metrics_with_broken_link() -> PageMetrics {
    PageMetrics {
        html_version: "HTML5".to_string(),
        page_title: "Example Domain".to_string(),
        h1_count: 1,
        h2_count: 2,
        internal_link_count: 3,
        external_link_count: 4,
        inaccessible_link_count: 1,
        broken_links: vec![BrokenLink {
            url: "https://example.com/missing".to_string(),
            status_code: 404,
            error: "Not Found".to_string(),
        }],
        has_login_form: true,
        error_message: Some("HTTP 500 Internal Server Error".to_string()),
        ..Default::default()
    }
}
