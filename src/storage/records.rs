//! Analysis record persistence.
//!
//! Every write is an independent statement; there are no multi-statement
//! transactions. The unique index on `url` carries the one-record-per-URL
//! invariant, and writes that must not clobber an external cancellation are
//! conditional on the stored status.

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::error_handling::DatabaseError;
use crate::storage::models::{AnalysisRecord, AnalysisStatus, BrokenLink, PageMetrics};

const RECORD_COLUMNS: &str = "id, url, status, html_version, page_title,
    h1_count, h2_count, h3_count, h4_count, h5_count, h6_count,
    internal_link_count, external_link_count, inaccessible_link_count,
    broken_links, has_login_form, error_message, created_at_ms, updated_at_ms";

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn record_from_row(row: &SqliteRow) -> Result<AnalysisRecord, DatabaseError> {
    let status: String = row.try_get("status")?;
    let status = AnalysisStatus::from_str(&status).map_err(|_| DatabaseError::InvalidStatus(status))?;
    let broken_links: String = row.try_get("broken_links")?;
    let broken_links: Vec<BrokenLink> = serde_json::from_str(&broken_links)?;

    Ok(AnalysisRecord {
        id: row.try_get("id")?,
        url: row.try_get("url")?,
        status,
        metrics: PageMetrics {
            html_version: row.try_get("html_version")?,
            page_title: row.try_get("page_title")?,
            h1_count: row.try_get("h1_count")?,
            h2_count: row.try_get("h2_count")?,
            h3_count: row.try_get("h3_count")?,
            h4_count: row.try_get("h4_count")?,
            h5_count: row.try_get("h5_count")?,
            h6_count: row.try_get("h6_count")?,
            internal_link_count: row.try_get("internal_link_count")?,
            external_link_count: row.try_get("external_link_count")?,
            inaccessible_link_count: row.try_get("inaccessible_link_count")?,
            broken_links,
            has_login_form: row.try_get("has_login_form")?,
            error_message: row.try_get("error_message")?,
        },
        created_at_ms: row.try_get("created_at_ms")?,
        updated_at_ms: row.try_get("updated_at_ms")?,
    })
}

/// Creates a record for `url` in `queued` state, or resets the existing one.
///
/// Resetting clears every metric and un-deletes a soft-deleted row; the
/// identifier of an existing record never changes.
pub async fn upsert_queued(pool: &SqlitePool, url: &str) -> Result<AnalysisRecord, DatabaseError> {
    let now = now_ms();
    let row = sqlx::query(&format!(
        "INSERT INTO url_analyses (url, status, created_at_ms, updated_at_ms)
         VALUES (?, 'queued', ?, ?)
         ON CONFLICT(url) DO UPDATE SET
             status = 'queued',
             html_version = '',
             page_title = '',
             h1_count = 0, h2_count = 0, h3_count = 0,
             h4_count = 0, h5_count = 0, h6_count = 0,
             internal_link_count = 0,
             external_link_count = 0,
             inaccessible_link_count = 0,
             broken_links = '[]',
             has_login_form = 0,
             error_message = NULL,
             updated_at_ms = excluded.updated_at_ms,
             deleted_at_ms = NULL
         RETURNING {RECORD_COLUMNS}"
    ))
    .bind(url)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    record_from_row(&row)
}

/// Resets an existing (not deleted) record to `queued`, clearing its metrics.
///
/// Returns `None` when no such record exists.
pub async fn requeue_by_id(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<AnalysisRecord>, DatabaseError> {
    let row = sqlx::query(&format!(
        "UPDATE url_analyses SET
             status = 'queued',
             html_version = '',
             page_title = '',
             h1_count = 0, h2_count = 0, h3_count = 0,
             h4_count = 0, h5_count = 0, h6_count = 0,
             internal_link_count = 0,
             external_link_count = 0,
             inaccessible_link_count = 0,
             broken_links = '[]',
             has_login_form = 0,
             error_message = NULL,
             updated_at_ms = ?
         WHERE id = ? AND deleted_at_ms IS NULL
         RETURNING {RECORD_COLUMNS}"
    ))
    .bind(now_ms())
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(record_from_row).transpose()
}

/// Fetches a record by identifier. Soft-deleted records are not returned.
pub async fn find_by_id(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<AnalysisRecord>, DatabaseError> {
    let row = sqlx::query(&format!(
        "SELECT {RECORD_COLUMNS} FROM url_analyses WHERE id = ? AND deleted_at_ms IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(record_from_row).transpose()
}

/// Fetches every record that has not been soft-deleted, newest first.
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<AnalysisRecord>, DatabaseError> {
    let rows = sqlx::query(&format!(
        "SELECT {RECORD_COLUMNS} FROM url_analyses
         WHERE deleted_at_ms IS NULL
         ORDER BY id DESC"
    ))
    .fetch_all(pool)
    .await?;

    rows.iter().map(record_from_row).collect()
}

/// Claims a `queued` record for a worker by moving it to `running`.
///
/// Returns `false` when the stored status is no longer `queued` (cancelled
/// meanwhile, or already claimed through a duplicate queue entry), in which
/// case the worker must not start the crawl.
pub async fn mark_running(pool: &SqlitePool, id: i64) -> Result<bool, DatabaseError> {
    let result = sqlx::query(
        "UPDATE url_analyses SET status = 'running', updated_at_ms = ?
         WHERE id = ? AND status = 'queued' AND deleted_at_ms IS NULL",
    )
    .bind(now_ms())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Sets `cancelled` on a record that is still `queued` or `running`.
///
/// Terminal records are never downgraded; returns whether a row changed.
pub async fn mark_cancelled(pool: &SqlitePool, id: i64) -> Result<bool, DatabaseError> {
    let result = sqlx::query(
        "UPDATE url_analyses SET status = 'cancelled', updated_at_ms = ?
         WHERE id = ? AND status IN ('queued', 'running')",
    )
    .bind(now_ms())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Writes the final state of a job, overwriting every mutable field.
///
/// Only the run that claimed the record may write: `done` and `errored`
/// require the stored status to still be `running`, and `cancelled` also
/// accepts an external cancellation. A record reset to `queued` by a
/// resubmission is left alone. Returns whether the row was updated.
pub async fn save_outcome(
    pool: &SqlitePool,
    id: i64,
    status: AnalysisStatus,
    metrics: &PageMetrics,
) -> Result<bool, DatabaseError> {
    let broken_links = serde_json::to_string(&metrics.broken_links)?;
    let guard = if status == AnalysisStatus::Cancelled {
        "status IN ('running', 'cancelled')"
    } else {
        "status = 'running'"
    };

    let result = sqlx::query(&format!(
        "UPDATE url_analyses SET
             status = ?,
             html_version = ?,
             page_title = ?,
             h1_count = ?, h2_count = ?, h3_count = ?,
             h4_count = ?, h5_count = ?, h6_count = ?,
             internal_link_count = ?,
             external_link_count = ?,
             inaccessible_link_count = ?,
             broken_links = ?,
             has_login_form = ?,
             error_message = ?,
             updated_at_ms = ?
         WHERE id = ? AND {guard}"
    ))
    .bind(status.to_string())
    .bind(&metrics.html_version)
    .bind(&metrics.page_title)
    .bind(metrics.h1_count)
    .bind(metrics.h2_count)
    .bind(metrics.h3_count)
    .bind(metrics.h4_count)
    .bind(metrics.h5_count)
    .bind(metrics.h6_count)
    .bind(metrics.internal_link_count)
    .bind(metrics.external_link_count)
    .bind(metrics.inaccessible_link_count)
    .bind(broken_links)
    .bind(metrics.has_login_form)
    .bind(&metrics.error_message)
    .bind(now_ms())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Soft-deletes a record. Returns `false` if it does not exist or is already deleted.
pub async fn soft_delete(pool: &SqlitePool, id: i64) -> Result<bool, DatabaseError> {
    let now = now_ms();
    let result = sqlx::query(
        "UPDATE url_analyses SET deleted_at_ms = ?, updated_at_ms = ?
         WHERE id = ? AND deleted_at_ms IS NULL",
    )
    .bind(now)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
