//! page_analyzer library: URL analysis service.
//!
//! Submitted URLs are stored in SQLite and handed to a fixed pool of job
//! workers through a bounded queue. Each worker crawls the single submitted
//! page, extracts its structure (HTML version, title, headings, login form,
//! internal/external links) and probes every discovered link for
//! reachability. Running jobs can be cancelled cooperatively.
//!
//! # Example
//!
//! ```no_run
//! use page_analyzer::{run_server, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config {
//!     bind: "127.0.0.1:8080".to_string(),
//!     workers: 3,
//!     ..Default::default()
//! };
//! run_server(config).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime.

pub mod api;
mod app;
pub mod config;
pub mod crawl;
pub mod error_handling;
pub mod initialization;
pub mod jobs;
pub mod service;
pub mod storage;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel};
pub use service::{AnalysisService, CancelOutcome};
pub use storage::{AnalysisRecord, AnalysisStatus, BrokenLink, PageMetrics};

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use log::info;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::api::AppState;
use crate::app::shutdown_gracefully;
use crate::crawl::{CrawlContext, LinkChecker};
use crate::error_handling::{InitializationError, ProcessingStats};
use crate::initialization::{init_page_client, init_probe_client};
use crate::jobs::{job_channel, CancellationRegistry, WorkerPool};
use crate::storage::{init_db_pool_with_path, run_migrations};

/// Binds `config.bind` and runs the service until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or start-up fails.
pub async fn run_server(config: Config) -> Result<()> {
    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind API to {}", config.bind))?;
    run_server_on(listener, config, CancellationToken::new()).await
}

/// Runs the service on an already bound listener until Ctrl-C or `cancel`.
///
/// Start-up order: database pool, migrations, HTTP clients, worker pool, API.
/// On shutdown the API stops first, then workers finish their current job.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or migrated, if an HTTP
/// client cannot be built, or if the API server fails.
pub async fn run_server_on(
    listener: TcpListener,
    config: Config,
    cancel: CancellationToken,
) -> Result<()> {
    let started = Instant::now();

    let pool = init_db_pool_with_path(&config.db_path)
        .await
        .context("Failed to initialize database pool")?;
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let page_client = init_page_client(&config)
        .map_err(InitializationError::from)
        .context("Failed to initialize page client")?;
    let probe_client = init_probe_client(&config)
        .map_err(InitializationError::from)
        .context("Failed to initialize link probe client")?;

    let stats = Arc::new(ProcessingStats::new());
    let registry = Arc::new(CancellationRegistry::new());
    let (queue, receiver) = job_channel(config.queue_capacity);

    let ctx = Arc::new(CrawlContext {
        pool: Arc::clone(&pool),
        page_client,
        link_checker: LinkChecker::new(probe_client, config.link_check_workers),
        stats: Arc::clone(&stats),
    });
    let workers = WorkerPool::start(config.workers, receiver, ctx, Arc::clone(&registry));

    info!(
        "page_analyzer ready: {} workers, queue capacity {}, {} link probes per job, database {}",
        workers.size(),
        config.queue_capacity,
        config.link_check_workers,
        config.db_path.display()
    );

    let state = AppState {
        service: AnalysisService::new(Arc::clone(&pool), queue, registry),
        stats: Arc::clone(&stats),
    };
    let served = api::serve(listener, state, cancel).await;

    shutdown_gracefully(workers, pool, &stats, started).await;
    served
}
