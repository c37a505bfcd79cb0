//! HTTP client initialization.
//!
//! Two clients are shared by all workers: one for fetching the analysed page
//! and one for the lightweight link reachability probes.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::{Config, MAX_REDIRECT_HOPS, TCP_CONNECT_TIMEOUT_SECS};

/// Initializes the HTTP client used to fetch the analysed page.
///
/// Creates a `reqwest::Client` configured with:
/// - User-Agent header from the configuration
/// - Overall request timeout from `page_timeout_secs`
/// - Connect timeout bounded by the overall timeout
/// - Redirect following (up to `MAX_REDIRECT_HOPS`)
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_page_client(config: &Config) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let connect_timeout = TCP_CONNECT_TIMEOUT_SECS.min(config.page_timeout_secs);
    let client = ClientBuilder::new()
        .timeout(config.page_timeout())
        .connect_timeout(Duration::from_secs(connect_timeout))
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECT_HOPS))
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(Arc::new(client))
}

/// Initializes the HTTP client used for link reachability probes.
///
/// Probes are HEAD requests bounded individually by `link_timeout_secs`.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_probe_client(config: &Config) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .timeout(config.link_timeout())
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECT_HOPS))
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(Arc::new(client))
}
