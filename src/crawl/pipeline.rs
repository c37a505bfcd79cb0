//! Crawl pipeline state machine.
//!
//! Runs one job from `queued` to a terminal state:
//! load -> running -> fetch -> parse -> link check -> persist.
//! Cancellation is polled at fixed checkpoints (before start, after the fetch,
//! inside the link checker and after the link check). Once observed it wins
//! over any `errored` outcome.

use std::sync::Arc;

use log::{debug, info, warn};
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::CANCELLED_TITLE;
use crate::crawl::extract::{analyze_html, PageStructure};
use crate::crawl::fetch::fetch_page;
use crate::crawl::links::{LinkCheckReport, LinkChecker};
use crate::error_handling::{ErrorType, ProcessingStats};
use crate::storage::records::{find_by_id, mark_cancelled, mark_running, save_outcome};
use crate::storage::{AnalysisRecord, AnalysisStatus, PageMetrics};

/// Shared resources every job needs.
pub struct CrawlContext {
    pub pool: Arc<SqlitePool>,
    pub page_client: Arc<reqwest::Client>,
    pub link_checker: LinkChecker,
    pub stats: Arc<ProcessingStats>,
}

/// How a pipeline run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Done,
    /// Carries the fetch error description.
    Errored(String),
    Cancelled,
    /// The job was not run: record missing or deleted, already claimed, or
    /// unreadable.
    Skipped,
}

/// Metrics written for a cancelled job. Every field is reset.
pub fn cancelled_metrics() -> PageMetrics {
    PageMetrics {
        page_title: CANCELLED_TITLE.to_string(),
        ..Default::default()
    }
}

/// Runs the crawl for `job_id`, persisting the final state.
///
/// Never fails: storage problems are logged and leave the record in its last
/// persisted state.
pub async fn run_pipeline(
    ctx: &CrawlContext,
    job_id: i64,
    token: &CancellationToken,
) -> JobOutcome {
    let record = match find_by_id(&ctx.pool, job_id).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            info!("Job {job_id} no longer exists, skipping");
            return JobOutcome::Skipped;
        }
        Err(e) => {
            ctx.stats.increment_error(ErrorType::StorageReadError);
            warn!("Failed to load job {job_id}: {e}");
            return JobOutcome::Skipped;
        }
    };

    if let Some(outcome) = check_cancelled_before_start(ctx, &record, token).await {
        return outcome;
    }
    if record.status != AnalysisStatus::Queued {
        debug!("Job {job_id} is {}, not queued; skipping", record.status);
        return JobOutcome::Skipped;
    }

    match mark_running(&ctx.pool, job_id).await {
        Ok(true) => info!("Job {job_id} running: {}", record.url),
        Ok(false) => return reconcile_unclaimed(ctx, job_id).await,
        Err(e) => {
            ctx.stats.increment_error(ErrorType::StorageWriteError);
            warn!("Failed to mark job {job_id} running: {e}");
            return JobOutcome::Skipped;
        }
    }

    let page = fetch_page(&ctx.page_client, &record.url, &ctx.stats).await;
    if token.is_cancelled() {
        return finish_cancelled(ctx, job_id).await;
    }

    let base = match Url::parse(&page.final_url).or_else(|_| Url::parse(&record.url)) {
        Ok(base) => base,
        Err(e) => {
            let message = format!("Invalid URL {}: {e}", record.url);
            return finish(ctx, job_id, AnalysisStatus::Errored, error_metrics(&message)).await;
        }
    };
    let structure = analyze_html(&page.body, &base);

    let report = if page.is_success() {
        ctx.link_checker.check(&structure.candidates, token).await
    } else {
        LinkCheckReport::default()
    };

    if token.is_cancelled() {
        return finish_cancelled(ctx, job_id).await;
    }

    let mut metrics = build_metrics(structure, report);
    match page.error {
        Some(message) => {
            metrics.error_message = Some(message);
            finish(ctx, job_id, AnalysisStatus::Errored, metrics).await
        }
        None => finish(ctx, job_id, AnalysisStatus::Done, metrics).await,
    }
}

/// First checkpoint: the token was signalled or the record was cancelled
/// while still queued. Metrics are left untouched.
async fn check_cancelled_before_start(
    ctx: &CrawlContext,
    record: &AnalysisRecord,
    token: &CancellationToken,
) -> Option<JobOutcome> {
    if record.status == AnalysisStatus::Cancelled {
        info!("Job {} was cancelled before it started", record.id);
        return Some(JobOutcome::Cancelled);
    }
    if !token.is_cancelled() {
        return None;
    }
    if record.status.is_terminal() {
        return Some(JobOutcome::Skipped);
    }
    if let Err(e) = mark_cancelled(&ctx.pool, record.id).await {
        ctx.stats.increment_error(ErrorType::StorageWriteError);
        warn!("Failed to mark job {} cancelled: {e}", record.id);
    }
    info!("Job {} was cancelled before it started", record.id);
    Some(JobOutcome::Cancelled)
}

/// `mark_running` refused the claim; find out why.
async fn reconcile_unclaimed(ctx: &CrawlContext, job_id: i64) -> JobOutcome {
    match find_by_id(&ctx.pool, job_id).await {
        Ok(Some(record)) if record.status == AnalysisStatus::Cancelled => {
            info!("Job {job_id} was cancelled before it started");
            JobOutcome::Cancelled
        }
        Ok(_) => JobOutcome::Skipped,
        Err(e) => {
            ctx.stats.increment_error(ErrorType::StorageReadError);
            warn!("Failed to reload job {job_id}: {e}");
            JobOutcome::Skipped
        }
    }
}

fn build_metrics(structure: PageStructure, report: LinkCheckReport) -> PageMetrics {
    let mut metrics = PageMetrics {
        html_version: structure.html_version,
        page_title: structure.title,
        internal_link_count: structure.internal_links,
        external_link_count: structure.external_links,
        inaccessible_link_count: report.broken_count as i64,
        broken_links: report.broken_links,
        has_login_form: structure.has_login_form,
        ..Default::default()
    };
    metrics.set_heading_counts(structure.heading_counts);
    metrics
}

fn error_metrics(message: &str) -> PageMetrics {
    PageMetrics {
        error_message: Some(message.to_string()),
        ..Default::default()
    }
}

async fn finish_cancelled(ctx: &CrawlContext, job_id: i64) -> JobOutcome {
    let metrics = cancelled_metrics();
    match save_outcome(&ctx.pool, job_id, AnalysisStatus::Cancelled, &metrics).await {
        Ok(true) => {}
        Ok(false) => {
            info!("Job {job_id} was resubmitted while running; discarding this run");
            return JobOutcome::Skipped;
        }
        Err(e) => {
            ctx.stats.increment_error(ErrorType::StorageWriteError);
            warn!("Failed to persist cancellation of job {job_id}: {e}");
        }
    }
    info!("Job {job_id} cancelled");
    JobOutcome::Cancelled
}

/// Persists a `done` or `errored` outcome.
///
/// The write is refused when the record left `running` meanwhile: an external
/// cancellation is then completed with cancelled metrics, a resubmission is
/// left for the next run.
async fn finish(
    ctx: &CrawlContext,
    job_id: i64,
    status: AnalysisStatus,
    metrics: PageMetrics,
) -> JobOutcome {
    match save_outcome(&ctx.pool, job_id, status, &metrics).await {
        Ok(true) => {}
        Ok(false) => return finish_cancelled(ctx, job_id).await,
        Err(e) => {
            ctx.stats.increment_error(ErrorType::StorageWriteError);
            warn!("Failed to persist outcome of job {job_id}: {e}");
        }
    }

    match metrics.error_message {
        Some(message) if status == AnalysisStatus::Errored => {
            info!("Job {job_id} errored: {message}");
            JobOutcome::Errored(message)
        }
        _ => {
            info!(
                "Job {job_id} done: {} internal, {} external, {} broken links",
                metrics.internal_link_count,
                metrics.external_link_count,
                metrics.inaccessible_link_count
            );
            JobOutcome::Done
        }
    }
}
