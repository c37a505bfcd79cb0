//! Job dispatch: bounded queue, worker pool and cancellation registry.

mod queue;
mod registry;
mod worker;

pub use queue::{job_channel, JobQueue, JobReceiver};
pub use registry::CancellationRegistry;
pub use worker::WorkerPool;
