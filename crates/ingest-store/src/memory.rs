//! In-memory batch store (process lifetime only).

use async_trait::async_trait;
use ingest_types::{Batch, BatchStatus, BatchStore, Ingestion, StoreError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    /// ingestion_id -> ingestion.
    ingestions: HashMap<String, Ingestion>,
    /// batch_id -> batch.
    batches: HashMap<String, Batch>,
    /// batch ids in insertion order (for pending_batches).
    order: Vec<String>,
}

/// In-memory implementation of BatchStore.
/// One lock covers all tables so an ingestion and its batches become visible together.
#[derive(Clone, Default)]
pub struct InMemoryBatchStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryBatchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BatchStore for InMemoryBatchStore {
    async fn create_ingestion(
        &self,
        ingestion: &Ingestion,
        batches: &[Batch],
    ) -> Result<(), StoreError> {
        let mut guard = self.tables.write().await;
        if guard.ingestions.contains_key(&ingestion.ingestion_id) {
            return Err(StoreError::Duplicate(ingestion.ingestion_id.clone()));
        }
        for (i, b) in batches.iter().enumerate() {
            let repeated = batches[..i].iter().any(|p| p.batch_id == b.batch_id);
            if repeated || guard.batches.contains_key(&b.batch_id) {
                return Err(StoreError::Duplicate(b.batch_id.clone()));
            }
        }
        for b in batches {
            guard.order.push(b.batch_id.clone());
            guard.batches.insert(b.batch_id.clone(), b.clone());
        }
        guard
            .ingestions
            .insert(ingestion.ingestion_id.clone(), ingestion.clone());
        tracing::debug!(
            ingestion_id = %ingestion.ingestion_id,
            batches = batches.len(),
            "ingestion stored"
        );
        Ok(())
    }

    async fn get_ingestion(&self, ingestion_id: &str) -> Result<Option<Ingestion>, StoreError> {
        let guard = self.tables.read().await;
        Ok(guard.ingestions.get(ingestion_id).cloned())
    }

    async fn get_batches(&self, batch_ids: &[String]) -> Result<Vec<Batch>, StoreError> {
        let guard = self.tables.read().await;
        Ok(batch_ids
            .iter()
            .filter_map(|id| guard.batches.get(id).cloned())
            .collect())
    }

    async fn update_batch_status(
        &self,
        batch_id: &str,
        status: BatchStatus,
    ) -> Result<(), StoreError> {
        let mut guard = self.tables.write().await;
        let batch = guard
            .batches
            .get_mut(batch_id)
            .ok_or_else(|| StoreError::NotFound(batch_id.to_string()))?;
        if !batch.status.can_advance_to(status) {
            return Err(StoreError::Other(format!(
                "illegal status transition for batch {}: {} -> {}",
                batch_id, batch.status, status
            )));
        }
        batch.status = status;
        Ok(())
    }

    async fn pending_batches(&self) -> Result<Vec<Batch>, StoreError> {
        let guard = self.tables.read().await;
        Ok(guard
            .order
            .iter()
            .filter_map(|id| guard.batches.get(id))
            .filter(|b| b.status == BatchStatus::YetToStart)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::ingestion_with;
    use chrono::Utc;
    use ingest_types::Priority;

    #[tokio::test]
    async fn create_then_read_back_in_order() {
        let store = InMemoryBatchStore::new();
        let (ing, batches) =
            ingestion_with("i1", Priority::High, Utc::now(), &[&[1, 2, 3], &[4, 5]]);
        store.create_ingestion(&ing, &batches).await.unwrap();

        let got = store.get_ingestion("i1").await.unwrap().unwrap();
        assert_eq!(got, ing);
        let got_batches = store.get_batches(&got.batch_refs).await.unwrap();
        assert_eq!(got_batches, batches);
        assert!(store.get_ingestion("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_ids_are_rejected_without_partial_writes() {
        let store = InMemoryBatchStore::new();
        let now = Utc::now();
        let (ing, batches) = ingestion_with("i1", Priority::Low, now, &[&[1]]);
        store.create_ingestion(&ing, &batches).await.unwrap();

        let (ing2, mut batches2) = ingestion_with("i2", Priority::Low, now, &[&[2], &[3]]);
        batches2[1].batch_id = "i1-b0".to_string();
        let err = store.create_ingestion(&ing2, &batches2).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert!(store.get_ingestion("i2").await.unwrap().is_none());
        assert!(store
            .get_batches(&["i2-b0".to_string()])
            .await
            .unwrap()
            .is_empty());

        let err = store.create_ingestion(&ing, &[]).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn status_only_moves_forward() {
        let store = InMemoryBatchStore::new();
        let (ing, batches) = ingestion_with("i1", Priority::Medium, Utc::now(), &[&[1]]);
        store.create_ingestion(&ing, &batches).await.unwrap();

        assert!(store
            .update_batch_status("i1-b0", BatchStatus::Completed)
            .await
            .is_err());
        store
            .update_batch_status("i1-b0", BatchStatus::Triggered)
            .await
            .unwrap();
        store
            .update_batch_status("i1-b0", BatchStatus::Completed)
            .await
            .unwrap();
        assert!(store
            .update_batch_status("i1-b0", BatchStatus::Triggered)
            .await
            .is_err());
        assert!(matches!(
            store
                .update_batch_status("missing", BatchStatus::Triggered)
                .await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn pending_lists_only_yet_to_start_in_insertion_order() {
        let store = InMemoryBatchStore::new();
        let now = Utc::now();
        let (a, ab) = ingestion_with("a", Priority::Low, now, &[&[1], &[2]]);
        let (b, bb) = ingestion_with("b", Priority::High, now, &[&[3]]);
        store.create_ingestion(&a, &ab).await.unwrap();
        store.create_ingestion(&b, &bb).await.unwrap();
        store
            .update_batch_status("a-b0", BatchStatus::Triggered)
            .await
            .unwrap();

        let pending: Vec<String> = store
            .pending_batches()
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.batch_id)
            .collect();
        assert_eq!(pending, vec!["a-b1", "b-b0"]);
    }
}
