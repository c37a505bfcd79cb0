//! Cancellation registry.
//!
//! Maps a job identifier to the cancellation token of the worker currently
//! processing it. Entries only exist between a worker picking a job up and
//! that job reaching a terminal state.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use log::{debug, warn};
use tokio_util::sync::CancellationToken;

/// Concurrency-safe registry of live job cancellation tokens.
///
/// Shared (behind an `Arc`) by the worker pool and the analysis service.
#[derive(Default)]
pub struct CancellationRegistry {
    tokens: Mutex<HashMap<i64, CancellationToken>>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn tokens(&self) -> MutexGuard<'_, HashMap<i64, CancellationToken>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.tokens.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Creates and stores a fresh token for `job_id`.
    ///
    /// Called by a worker immediately before running the crawl pipeline.
    pub fn register(&self, job_id: i64) -> CancellationToken {
        let token = CancellationToken::new();
        if self.tokens().insert(job_id, token.clone()).is_some() {
            warn!("Replaced an existing cancellation token for job {job_id}");
        }
        token
    }

    /// Returns the live token for `job_id`, if any.
    pub fn lookup(&self, job_id: i64) -> Option<CancellationToken> {
        self.tokens().get(&job_id).cloned()
    }

    /// Removes the token for `job_id`. Called after the pipeline returns,
    /// whatever the outcome.
    pub fn unregister(&self, job_id: i64) {
        self.tokens().remove(&job_id);
    }

    /// Signals and removes the token for `job_id`.
    ///
    /// Returns `false` when no token is registered, meaning the job is either
    /// still queued or already terminal; the caller then owns updating the
    /// persisted status. Cancellation is cooperative: in-flight requests run
    /// to completion and only the next pipeline checkpoint observes it.
    pub fn request_cancel(&self, job_id: i64) -> bool {
        let token = self.tokens().remove(&job_id);
        match token {
            Some(token) => {
                token.cancel();
                debug!("Signalled cancellation for running job {job_id}");
                true
            }
            None => false,
        }
    }

    /// Number of jobs currently registered.
    pub fn active_jobs(&self) -> usize {
        self.tokens().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let registry = CancellationRegistry::new();
        let token = registry.register(1);

        let found = registry.lookup(1).expect("token should be registered");
        assert!(!found.is_cancelled());
        token.cancel();
        assert!(found.is_cancelled(), "lookup returns the same token");
        assert!(registry.lookup(2).is_none());
    }

    #[test]
    fn test_request_cancel_signals_and_removes() {
        let registry = CancellationRegistry::new();
        let token = registry.register(7);

        assert!(registry.request_cancel(7));
        assert!(token.is_cancelled());
        assert!(registry.lookup(7).is_none());
        assert!(!registry.request_cancel(7), "second request finds nothing");
    }

    #[test]
    fn test_request_cancel_unknown_job() {
        let registry = CancellationRegistry::new();
        assert!(!registry.request_cancel(99));
    }

    #[test]
    fn test_unregister_leaves_token_unsignalled() {
        let registry = CancellationRegistry::new();
        let token = registry.register(3);
        registry.unregister(3);

        assert!(!token.is_cancelled());
        assert_eq!(registry.active_jobs(), 0);
    }

    #[test]
    fn test_register_keeps_one_token_per_job() {
        let registry = CancellationRegistry::new();
        let _first = registry.register(5);
        let second = registry.register(5);

        assert_eq!(registry.active_jobs(), 1);
        registry.request_cancel(5);
        assert!(second.is_cancelled());
    }
}
