//! Traits for the batch store, the per-identifier worker, and id generation.

use crate::{Batch, BatchStatus, Ingestion};
use async_trait::async_trait;

/// Durable record of ingestions and their batches.
#[async_trait]
pub trait BatchStore: Send + Sync {
    /// Persist an ingestion together with all of its batches.
    ///
    /// Either everything is stored or nothing is; duplicate ids fail with
    /// [`StoreError::Duplicate`].
    async fn create_ingestion(
        &self,
        ingestion: &Ingestion,
        batches: &[Batch],
    ) -> Result<(), StoreError>;

    /// Get one ingestion by id.
    async fn get_ingestion(&self, ingestion_id: &str) -> Result<Option<Ingestion>, StoreError>;

    /// Get batches by id, in the order requested. Unknown ids are skipped.
    async fn get_batches(&self, batch_ids: &[String]) -> Result<Vec<Batch>, StoreError>;

    /// Move a batch one step forward (`yet_to_start -> triggered -> completed`).
    async fn update_batch_status(
        &self,
        batch_id: &str,
        status: BatchStatus,
    ) -> Result<(), StoreError>;

    /// All batches still `yet_to_start`, oldest first.
    async fn pending_batches(&self) -> Result<Vec<Batch>, StoreError>;
}

/// Processes a single identifier against the external system.
#[async_trait]
pub trait FetchWorker: Send + Sync {
    async fn fetch(&self, id: i64) -> Result<serde_json::Value, WorkerError>;
}

/// Source of globally unique ids for ingestions and batches.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdSource;

impl IdSource for UuidIdSource {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate key: {0}")]
    Duplicate(String),
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("store error: {0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("fetch failed for id {id}: {reason}")]
    Failed { id: i64, reason: String },
    #[error("fetch timed out for id {id}")]
    Timeout { id: i64 },
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("scheduler error: {0}")]
    Other(String),
}

/// Errors surfaced by the ingestion service to its callers.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    NotFound(String),
    #[error("persistence: {0}")]
    Persistence(#[from] StoreError),
    #[error("scheduler: {0}")]
    Scheduler(#[from] SchedulerError),
}
