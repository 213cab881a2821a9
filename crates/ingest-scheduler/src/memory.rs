//! In-memory scheduler: one priority queue, at most one drain loop, batch status in the store.

use crate::{JobQueue, Scheduler, SchedulerConfig, SchedulerError, SchedulerState};
use async_trait::async_trait;
use ingest_types::{BatchStatus, BatchStore, FetchWorker, Job, StoreError, WorkerError};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

struct Shared {
    queue: JobQueue,
    state: SchedulerState,
}

struct Inner {
    /// Queue and loop state change together under this lock; it is never held across a batch.
    shared: Mutex<Shared>,
    store: Arc<dyn BatchStore>,
    worker: Arc<dyn FetchWorker>,
    config: SchedulerConfig,
}

/// Outcome counts for one processed batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct BatchOutcome {
    succeeded: usize,
    failed: usize,
}

/// In-memory scheduler: drains queued batches in priority order, invoking the worker for
/// every id of a batch concurrently and pausing `batch_delay` between batches.
#[derive(Clone)]
pub struct InMemoryScheduler {
    inner: Arc<Inner>,
}

impl InMemoryScheduler {
    pub fn new(
        store: Arc<dyn BatchStore>,
        worker: Arc<dyn FetchWorker>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                shared: Mutex::new(Shared {
                    queue: JobQueue::new(),
                    state: SchedulerState::Idle,
                }),
                store,
                worker,
                config,
            }),
        }
    }
}

impl Inner {
    async fn drain(self: Arc<Self>) {
        tracing::debug!("drain loop started");
        loop {
            let job = {
                let mut guard = self.shared.lock().await;
                match guard.queue.extract_next() {
                    Some(job) => job,
                    None => {
                        guard.state = SchedulerState::Idle;
                        break;
                    }
                }
            };
            let batch_id = job.batch_id.clone();
            let ingestion_id = job.ingestion_id.clone();

            // Run the batch in its own task so a panic cannot take the loop down.
            let this = Arc::clone(&self);
            match tokio::spawn(async move { this.process(job).await }).await {
                Ok(Ok(outcome)) => tracing::info!(
                    batch_id = %batch_id,
                    ingestion_id = %ingestion_id,
                    succeeded = outcome.succeeded,
                    failed = outcome.failed,
                    "batch completed"
                ),
                Ok(Err(e)) => tracing::error!(
                    batch_id = %batch_id,
                    ingestion_id = %ingestion_id,
                    error = %e,
                    "error processing batch"
                ),
                Err(e) => tracing::error!(
                    batch_id = %batch_id,
                    ingestion_id = %ingestion_id,
                    error = %e,
                    "batch task aborted"
                ),
            }

            if !self.config.batch_delay.is_zero() {
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }
        tracing::debug!("drain loop idle");
    }

    async fn process(&self, job: Job) -> Result<BatchOutcome, StoreError> {
        self.store
            .update_batch_status(&job.batch_id, BatchStatus::Triggered)
            .await?;
        tracing::debug!(batch_id = %job.batch_id, ids = job.ids.len(), "batch triggered");

        let mut set = JoinSet::new();
        for &id in &job.ids {
            let worker = Arc::clone(&self.worker);
            let timeout = self.config.worker_timeout;
            set.spawn(async move {
                match timeout {
                    Some(limit) => match tokio::time::timeout(limit, worker.fetch(id)).await {
                        Ok(res) => res,
                        Err(_) => Err(WorkerError::Timeout { id }),
                    },
                    None => worker.fetch(id).await,
                }
            });
        }

        let mut outcome = BatchOutcome::default();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(_)) => outcome.succeeded += 1,
                Ok(Err(e)) => {
                    outcome.failed += 1;
                    tracing::warn!(batch_id = %job.batch_id, error = %e, "fetch failed");
                }
                Err(e) => {
                    outcome.failed += 1;
                    tracing::warn!(batch_id = %job.batch_id, error = %e, "fetch task aborted");
                }
            }
        }

        self.store
            .update_batch_status(&job.batch_id, BatchStatus::Completed)
            .await?;
        Ok(outcome)
    }
}

#[async_trait]
impl Scheduler for InMemoryScheduler {
    async fn enqueue(&self, jobs: Vec<Job>) -> Result<usize, SchedulerError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| SchedulerError::Other(format!("no async runtime: {}", e)))?;
        let (accepted, start) = {
            let mut guard = self.inner.shared.lock().await;
            let mut accepted = 0;
            for job in jobs {
                let batch_id = job.batch_id.clone();
                if guard.queue.enqueue(job) {
                    accepted += 1;
                } else {
                    tracing::warn!(batch_id = %batch_id, "batch already queued; skipped");
                }
            }
            let start = accepted > 0 && guard.state == SchedulerState::Idle;
            if start {
                guard.state = SchedulerState::Running;
            }
            (accepted, start)
        };
        if start {
            handle.spawn(Arc::clone(&self.inner).drain());
        }
        Ok(accepted)
    }

    async fn state(&self) -> SchedulerState {
        self.inner.shared.lock().await.state
    }

    async fn pending(&self) -> usize {
        self.inner.shared.lock().await.queue.len()
    }
}
