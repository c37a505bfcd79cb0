//! Single-page crawl: fetch, extraction, link reachability and the per-job
//! state machine tying them together.

pub mod extract;
pub mod fetch;
pub mod links;
pub mod pipeline;

pub use extract::{analyze_html, PageStructure};
pub use fetch::{fetch_page, FetchedPage};
pub use links::{LinkCheckReport, LinkChecker};
pub use pipeline::{cancelled_metrics, run_pipeline, CrawlContext, JobOutcome};
