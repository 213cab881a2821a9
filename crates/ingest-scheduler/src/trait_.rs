//! Scheduler trait: enqueue batch jobs, observe loop state.

use async_trait::async_trait;
use ingest_types::Job;

pub use ingest_types::SchedulerError;

/// Whether a drain loop is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Accepts batch jobs and processes them in the background, one batch at a time.
///
/// Contract: `enqueue` never waits for processing. At most one drain loop runs at a
/// time; enqueuing while `Idle` starts one. A batch is marked `completed` once every
/// identifier has been attempted, whether or not the individual fetches succeeded.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Queue jobs and start the drain loop if idle. Returns the number of jobs accepted
    /// (jobs whose batch is already queued are skipped).
    async fn enqueue(&self, jobs: Vec<Job>) -> Result<usize, SchedulerError>;

    async fn state(&self) -> SchedulerState;

    /// Jobs waiting to be extracted.
    async fn pending(&self) -> usize;
}
