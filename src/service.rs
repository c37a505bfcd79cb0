//! Analysis service.
//!
//! The collaborator the HTTP layer calls: it validates submissions, maintains
//! records through `storage::records` and hands job identifiers to the queue
//! and the cancellation registry.

use std::sync::Arc;

use log::{debug, info};
use sqlx::SqlitePool;

use crate::app::validate_submitted_url;
use crate::error_handling::{DatabaseError, LookupError, SubmitError};
use crate::jobs::{CancellationRegistry, JobQueue};
use crate::storage::records;
use crate::storage::{AnalysisRecord, AnalysisStatus};

/// Result of a cancellation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The record is now `cancelled`. `was_running` tells whether a live
    /// worker was signalled.
    Cancelled { was_running: bool },
    /// The record was already terminal; nothing changed.
    AlreadyTerminal(AnalysisStatus),
}

/// Entry point for submitting, inspecting and controlling analyses.
#[derive(Clone)]
pub struct AnalysisService {
    pool: Arc<SqlitePool>,
    queue: JobQueue,
    registry: Arc<CancellationRegistry>,
}

impl AnalysisService {
    pub fn new(
        pool: Arc<SqlitePool>,
        queue: JobQueue,
        registry: Arc<CancellationRegistry>,
    ) -> Self {
        Self {
            pool,
            queue,
            registry,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Number of jobs a worker is currently processing.
    pub fn active_jobs(&self) -> usize {
        self.registry.active_jobs()
    }

    /// Number of job identifiers waiting in the queue.
    pub fn queued_jobs(&self) -> usize {
        self.queue.pending()
    }

    /// Submits a URL: creates its record, or resets an existing one to
    /// `queued`, then enqueues it.
    ///
    /// Waits for queue space when the queue is full.
    ///
    /// # Errors
    ///
    /// Validation failures (`EmptyUrl`, `InvalidUrl`) are returned before
    /// anything is stored.
    pub async fn submit(&self, raw_url: &str) -> Result<AnalysisRecord, SubmitError> {
        let url = validate_submitted_url(raw_url)?;
        let record = records::upsert_queued(&self.pool, &url).await?;
        self.queue.enqueue(record.id).await?;
        info!("Queued job {} for {}", record.id, record.url);
        Ok(record)
    }

    /// All records, newest first.
    pub async fn list(&self) -> Result<Vec<AnalysisRecord>, DatabaseError> {
        records::list_all(&self.pool).await
    }

    /// # Errors
    ///
    /// `LookupError::NotFound` when no live record has this identifier.
    pub async fn get(&self, id: i64) -> Result<AnalysisRecord, LookupError> {
        records::find_by_id(&self.pool, id)
            .await?
            .ok_or(LookupError::NotFound(id))
    }

    /// Cancels a queued or running job.
    ///
    /// A queued job is marked `cancelled` and skipped when a worker reaches
    /// it. A running job is marked `cancelled` and its worker is signalled;
    /// the worker stops at its next checkpoint.
    pub async fn cancel(&self, id: i64) -> Result<CancelOutcome, LookupError> {
        let record = self.get(id).await?;
        if record.status.is_terminal() {
            debug!("Cancel request for job {id} ignored: already {}", record.status);
            return Ok(CancelOutcome::AlreadyTerminal(record.status));
        }

        if !records::mark_cancelled(&self.pool, id).await? {
            // Finished between the read and the update.
            let status = self.get(id).await?.status;
            return Ok(CancelOutcome::AlreadyTerminal(status));
        }

        let was_running = self.registry.request_cancel(id);
        info!("Cancelled job {id} (was running: {was_running})");
        Ok(CancelOutcome::Cancelled { was_running })
    }

    /// Re-queues an existing record with the same reset as a resubmission.
    ///
    /// Does not wait for queue space, so bulk requests never stall. Returns
    /// `Ok(None)` when the record does not exist.
    ///
    /// # Errors
    ///
    /// `SubmitError::QueueFull` leaves the record `queued` without a queue
    /// entry; submitting it again picks it up.
    pub async fn requeue(&self, id: i64) -> Result<Option<AnalysisRecord>, SubmitError> {
        let Some(record) = records::requeue_by_id(&self.pool, id).await? else {
            return Ok(None);
        };
        self.queue.try_enqueue(record.id)?;
        info!("Re-queued job {} for {}", record.id, record.url);
        Ok(Some(record))
    }

    /// Soft-deletes a record and stops its worker if one is running.
    ///
    /// Returns `false` when there was no live record to delete.
    pub async fn soft_delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let deleted = records::soft_delete(&self.pool, id).await?;
        if deleted {
            self.registry.request_cancel(id);
            info!("Deleted job {id}");
        }
        Ok(deleted)
    }
}
