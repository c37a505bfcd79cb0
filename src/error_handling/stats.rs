//! Processing statistics tracking.
//!
//! This module provides thread-safe counters for errors and job outcomes
//! accumulated by the worker pool.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::ErrorType;

/// Thread-safe processing statistics tracker.
///
/// Tracks error categories and terminal job outcomes using atomic counters,
/// allowing concurrent access from every worker. All counters start at zero.
pub struct ProcessingStats {
    errors: HashMap<ErrorType, AtomicUsize>,
    jobs_done: AtomicUsize,
    jobs_errored: AtomicUsize,
    jobs_cancelled: AtomicUsize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        let mut errors = HashMap::new();
        for error in ErrorType::iter() {
            errors.insert(error, AtomicUsize::new(0));
        }

        ProcessingStats {
            errors,
            jobs_done: AtomicUsize::new(0),
            jobs_errored: AtomicUsize::new(0),
            jobs_cancelled: AtomicUsize::new(0),
        }
    }

    /// Increment an error counter.
    pub fn increment_error(&self, error: ErrorType) {
        if let Some(counter) = self.errors.get(&error) {
            counter.fetch_add(1, Ordering::SeqCst);
        } else {
            log::error!("Error type {:?} not found in stats map", error);
        }
    }

    pub fn get_error_count(&self, error: ErrorType) -> usize {
        self.errors
            .get(&error)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    pub fn total_errors(&self) -> usize {
        self.errors.values().map(|c| c.load(Ordering::SeqCst)).sum()
    }

    pub fn record_done(&self) {
        self.jobs_done.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_errored(&self) {
        self.jobs_errored.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_cancelled(&self) {
        self.jobs_cancelled.fetch_add(1, Ordering::SeqCst);
    }

    /// Returns `(done, errored, cancelled)` job counts.
    pub fn job_counts(&self) -> (usize, usize, usize) {
        (
            self.jobs_done.load(Ordering::SeqCst),
            self.jobs_errored.load(Ordering::SeqCst),
            self.jobs_cancelled.load(Ordering::SeqCst),
        )
    }
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_stats_initialization() {
        let stats = ProcessingStats::new();
        for error_type in ErrorType::iter() {
            assert_eq!(stats.get_error_count(error_type), 0);
        }
        assert_eq!(stats.job_counts(), (0, 0, 0));
    }

    #[test]
    fn test_processing_stats_increment() {
        let stats = ProcessingStats::new();
        stats.increment_error(ErrorType::HttpRequestConnectError);
        stats.increment_error(ErrorType::HttpRequestConnectError);
        stats.increment_error(ErrorType::StorageWriteError);

        assert_eq!(stats.get_error_count(ErrorType::HttpRequestConnectError), 2);
        assert_eq!(stats.total_errors(), 3);
    }

    #[test]
    fn test_job_counts() {
        let stats = ProcessingStats::new();
        stats.record_done();
        stats.record_done();
        stats.record_errored();
        stats.record_cancelled();
        assert_eq!(stats.job_counts(), (2, 1, 1));
    }
}
