//! Worker doubles for tests: no network, deterministic outcomes.

use ingest_types::{FetchWorker, WorkerError};
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

/// Succeeds for every id and records the order ids were started in.
pub struct RecordingWorker {
    latency: Duration,
    seen: Mutex<Vec<i64>>,
}

impl RecordingWorker {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Ids in the order `fetch` was called.
    pub fn seen(&self) -> Vec<i64> {
        self.seen.lock().map(|g| g.to_vec()).unwrap_or_default()
    }
}

impl Default for RecordingWorker {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

#[async_trait::async_trait]
impl FetchWorker for RecordingWorker {
    async fn fetch(&self, id: i64) -> Result<serde_json::Value, WorkerError> {
        if let Ok(mut g) = self.seen.lock() {
            g.push(id);
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(serde_json::json!({ "id": id }))
    }
}

/// Fails for the configured ids, succeeds for the rest.
pub struct FailingWorker {
    failing: HashSet<i64>,
    hang: bool,
}

impl FailingWorker {
    pub fn new(failing: impl IntoIterator<Item = i64>) -> Self {
        Self {
            failing: failing.into_iter().collect(),
            hang: false,
        }
    }

    /// Failing ids never return instead of erroring.
    pub fn hanging(failing: impl IntoIterator<Item = i64>) -> Self {
        Self {
            failing: failing.into_iter().collect(),
            hang: true,
        }
    }
}

#[async_trait::async_trait]
impl FetchWorker for FailingWorker {
    async fn fetch(&self, id: i64) -> Result<serde_json::Value, WorkerError> {
        if !self.failing.contains(&id) {
            return Ok(serde_json::json!({ "id": id }));
        }
        if self.hang {
            std::future::pending::<()>().await;
        }
        Err(WorkerError::Failed {
            id,
            reason: "injected failure".to_string(),
        })
    }
}
