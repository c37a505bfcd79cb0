//! Configuration constants.
//!
//! This module defines the constants used throughout the application,
//! including worker pool sizes, timeouts, and the labels written to analysis records.

// Job processing
/// Number of job workers running the crawl pipeline concurrently
pub const DEFAULT_WORKER_COUNT: usize = 3;
/// Maximum number of job identifiers waiting in the queue before submission blocks
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

// Link reachability checking
/// Number of concurrent probe workers spun up per job
pub const DEFAULT_LINK_CHECK_WORKERS: usize = 20;
/// Per-probe timeout in seconds
pub const DEFAULT_LINK_TIMEOUT_SECS: u64 = 5;

// Page fetching
/// Overall page fetch timeout in seconds
pub const DEFAULT_PAGE_TIMEOUT_SECS: u64 = 30;
/// TCP connection timeout in seconds (bounded by the overall page timeout)
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 30;
/// Maximum number of redirect hops to follow when fetching a page
pub const MAX_REDIRECT_HOPS: usize = 10;
/// Maximum page body kept for analysis (2MB); the rest of the body is discarded
pub const MAX_RESPONSE_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Default User-Agent string for HTTP requests.
///
/// Users can override this via the `--user-agent` CLI flag.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

// Storage and server defaults
pub const DB_PATH: &str = "./page_analyzer.db";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Maximum URL length (2048 characters), matching common browser and server limits.
pub const MAX_URL_LENGTH: usize = 2048;

// Record labels
/// Page title written to a record whose crawl was cancelled
pub const CANCELLED_TITLE: &str = "Crawl cancelled";
pub const HTML5_VERSION: &str = "HTML5";
pub const HTML4_VERSION: &str = "HTML4.01";
