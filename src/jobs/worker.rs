//! Fixed-size worker pool.
//!
//! Each worker repeatedly takes the next job identifier from the shared
//! receiver and runs the crawl pipeline to completion before taking another.
//! A cancellation token is registered around every job.

use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::crawl::{run_pipeline, CrawlContext, JobOutcome};
use crate::jobs::queue::JobReceiver;
use crate::jobs::registry::CancellationRegistry;

/// Handle to the running workers.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    shutdown: CancellationToken,
}

impl WorkerPool {
    /// Spawns `count` workers consuming from `receiver`.
    ///
    /// Workers run until `shutdown` is called or every queue sender is dropped.
    pub fn start(
        count: usize,
        receiver: JobReceiver,
        ctx: Arc<CrawlContext>,
        registry: Arc<CancellationRegistry>,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let handles = (0..count.max(1))
            .map(|worker_id| {
                let receiver = receiver.clone();
                let ctx = Arc::clone(&ctx);
                let registry = Arc::clone(&registry);
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    worker_loop(worker_id, receiver, ctx, registry, shutdown).await;
                })
            })
            .collect();

        info!("Started {} job workers", count.max(1));
        WorkerPool { handles, shutdown }
    }

    /// Number of spawned workers.
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Stops workers from taking new jobs and waits for in-flight jobs to end.
    ///
    /// Identifiers still queued are dropped; their records stay `queued`.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!("Job worker terminated abnormally: {e}");
            }
        }
        info!("All job workers stopped");
    }
}

async fn worker_loop(
    worker_id: usize,
    receiver: JobReceiver,
    ctx: Arc<CrawlContext>,
    registry: Arc<CancellationRegistry>,
    shutdown: CancellationToken,
) {
    loop {
        let job_id = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            next = receiver.recv() => match next {
                Some(job_id) => job_id,
                None => break,
            },
        };
        process_job(worker_id, job_id, &ctx, &registry).await;
    }
    log::debug!("Worker {worker_id} exiting");
}

/// Runs one job with its cancellation token registered.
///
/// The pipeline runs in its own task so a panic is contained to the job; the
/// token is unregistered whatever happens.
async fn process_job(
    worker_id: usize,
    job_id: i64,
    ctx: &Arc<CrawlContext>,
    registry: &CancellationRegistry,
) {
    let start = Instant::now();
    info!("Worker {worker_id} picked up job {job_id}");
    let token = registry.register(job_id);

    let job_ctx = Arc::clone(ctx);
    let result = tokio::spawn(async move { run_pipeline(&job_ctx, job_id, &token).await }).await;
    registry.unregister(job_id);

    let elapsed = start.elapsed().as_secs_f64();
    match result {
        Ok(JobOutcome::Done) => {
            ctx.stats.record_done();
            info!("Job {job_id} finished in {elapsed:.2}s");
        }
        Ok(JobOutcome::Errored(_)) => ctx.stats.record_errored(),
        Ok(JobOutcome::Cancelled) => ctx.stats.record_cancelled(),
        Ok(JobOutcome::Skipped) => {}
        Err(e) => {
            ctx.stats.record_errored();
            warn!("Job {job_id} panicked after {elapsed:.2}s: {e}");
        }
    }
}
