//! IngestionService: the submit / status façade over store, splitter, and scheduler.

use crate::{aggregate_status, split_into_batches, ServiceConfig};
use chrono::Utc;
use ingest_scheduler::Scheduler;
use ingest_types::{
    Batch, BatchStatus, BatchStore, BatchView, IdSource, IngestError, IngestRequest, Ingestion,
    Job, Priority, StatusResponse,
};
use std::sync::Arc;

/// Accepts ingestion requests and reports their progress.
///
/// Per-identifier fetch failures are not visible here: a batch reports `completed` once
/// every identifier was attempted, successful or not.
pub struct IngestionService {
    store: Arc<dyn BatchStore>,
    scheduler: Arc<dyn Scheduler>,
    id_source: Arc<dyn IdSource>,
    config: ServiceConfig,
}

impl IngestionService {
    pub fn new(
        store: Arc<dyn BatchStore>,
        scheduler: Arc<dyn Scheduler>,
        id_source: Arc<dyn IdSource>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            scheduler,
            id_source,
            config,
        }
    }

    /// Validate a raw request body and submit it.
    pub async fn submit_request(&self, req: &IngestRequest) -> Result<String, IngestError> {
        let (ids, priority) = req.validate()?;
        self.submit(&ids, priority).await
    }

    /// Split `ids` into batches, persist them, queue them, and return the new ingestion id.
    /// Returns before any batch is processed.
    pub async fn submit(&self, ids: &[i64], priority: Priority) -> Result<String, IngestError> {
        let groups = split_into_batches(ids, self.config.batch_size)?;
        let ingestion_id = self.id_source.next_id();
        let created_at = Utc::now();

        let batches: Vec<Batch> = groups
            .into_iter()
            .map(|ids| Batch {
                batch_id: self.id_source.next_id(),
                ingestion_id: ingestion_id.clone(),
                ids,
                priority,
                created_at,
                status: BatchStatus::YetToStart,
            })
            .collect();
        let ingestion = Ingestion {
            ingestion_id: ingestion_id.clone(),
            priority,
            created_at,
            batch_refs: batches.iter().map(|b| b.batch_id.clone()).collect(),
        };

        self.store.create_ingestion(&ingestion, &batches).await?;
        let jobs: Vec<Job> = batches.iter().map(Job::from).collect();
        self.scheduler.enqueue(jobs).await?;

        tracing::info!(
            ingestion_id = %ingestion_id,
            priority = %priority,
            ids = ids.len(),
            batches = batches.len(),
            "ingestion submitted"
        );
        Ok(ingestion_id)
    }

    /// Current status of an ingestion and each of its batches, in creation order.
    pub async fn get_status(&self, ingestion_id: &str) -> Result<StatusResponse, IngestError> {
        let ingestion = self
            .store
            .get_ingestion(ingestion_id)
            .await?
            .ok_or_else(|| IngestError::NotFound("Ingestion ID not found".to_string()))?;
        let batches = self.store.get_batches(&ingestion.batch_refs).await?;
        let status = aggregate_status(batches.iter().map(|b| b.status));
        Ok(StatusResponse {
            ingestion_id: ingestion.ingestion_id,
            status,
            batches: batches
                .into_iter()
                .map(|b| BatchView {
                    batch_id: b.batch_id,
                    ids: b.ids,
                    status: b.status,
                })
                .collect(),
        })
    }

    /// Re-queue every persisted batch that has not started yet. Call once at startup.
    pub async fn recover(&self) -> Result<usize, IngestError> {
        let pending = self.store.pending_batches().await?;
        if pending.is_empty() {
            return Ok(0);
        }
        let jobs: Vec<Job> = pending.iter().map(Job::from).collect();
        let accepted = self.scheduler.enqueue(jobs).await?;
        tracing::info!(batches = accepted, "re-queued unstarted batches");
        Ok(accepted)
    }
}
