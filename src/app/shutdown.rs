//! Graceful shutdown handling.

use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

use crate::app::statistics::log_final_statistics;
use crate::error_handling::ProcessingStats;
use crate::jobs::WorkerPool;

/// Resolves on Ctrl-C or once `cancel` is signalled.
///
/// Passed to `axum::serve(..).with_graceful_shutdown`.
pub async fn shutdown_signal(cancel: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => info!("Received Ctrl-C, shutting down"),
            Err(e) => warn!("Failed to listen for Ctrl-C: {e}"),
        },
        _ = cancel.cancelled() => info!("Shutdown requested"),
    }
}

/// Stops the workers after their in-flight jobs, logs statistics and closes
/// the database pool.
///
/// Jobs still queued are dropped; their records stay `queued`.
pub async fn shutdown_gracefully(
    workers: WorkerPool,
    pool: Arc<SqlitePool>,
    stats: &ProcessingStats,
    started: Instant,
) {
    workers.shutdown().await;
    log_final_statistics(stats, started.elapsed().as_secs_f64());
    pool.close().await;
}
