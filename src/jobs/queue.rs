//! Bounded job queue.
//!
//! A FIFO handoff of job identifiers from submission to the worker pool. The
//! sending half (`JobQueue`) is cloned into the analysis service; the receiving
//! half (`JobReceiver`) is shared by every worker, so each identifier is taken
//! by exactly one worker.

use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;

use crate::error_handling::SubmitError;

/// Creates a queue holding at most `capacity` outstanding identifiers.
pub fn job_channel(capacity: usize) -> (JobQueue, JobReceiver) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (
        JobQueue { sender },
        JobReceiver {
            inner: Arc::new(Mutex::new(receiver)),
        },
    )
}

/// Sending half of the job queue.
#[derive(Clone, Debug)]
pub struct JobQueue {
    sender: mpsc::Sender<i64>,
}

impl JobQueue {
    /// Adds a job identifier, waiting for space when the queue is full.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError::QueueClosed` once every worker has stopped.
    pub async fn enqueue(&self, job_id: i64) -> Result<(), SubmitError> {
        self.sender
            .send(job_id)
            .await
            .map_err(|_| SubmitError::QueueClosed)
    }

    /// Adds a job identifier without waiting.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError::QueueFull` when at capacity and
    /// `SubmitError::QueueClosed` once every worker has stopped.
    pub fn try_enqueue(&self, job_id: i64) -> Result<(), SubmitError> {
        self.sender.try_send(job_id).map_err(|e| match e {
            TrySendError::Full(_) => SubmitError::QueueFull,
            TrySendError::Closed(_) => SubmitError::QueueClosed,
        })
    }

    /// Number of identifiers currently waiting.
    pub fn pending(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }
}

/// Receiving half of the job queue, shared by all workers.
#[derive(Clone, Debug)]
pub struct JobReceiver {
    inner: Arc<Mutex<mpsc::Receiver<i64>>>,
}

impl JobReceiver {
    /// Takes the next identifier, or `None` once every sender is gone.
    pub async fn recv(&self) -> Option<i64> {
        self.inner.lock().await.recv().await
    }
}
