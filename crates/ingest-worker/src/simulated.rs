//! Stand-in for the external fetch: waits a fixed latency, then succeeds.

use ingest_types::{FetchWorker, WorkerError};
use std::time::Duration;

const DEFAULT_LATENCY: Duration = Duration::from_millis(1000);

pub struct SimulatedFetcher {
    latency: Duration,
}

impl SimulatedFetcher {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// Latency from `INGEST_FETCH_LATENCY_MS` (default 1000ms).
    pub fn from_env() -> Self {
        Self::new(latency_from(std::env::var("INGEST_FETCH_LATENCY_MS").ok()))
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }
}

impl Default for SimulatedFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_LATENCY)
    }
}

fn latency_from(raw: Option<String>) -> Duration {
    let Some(raw) = raw else {
        return DEFAULT_LATENCY;
    };
    match raw.trim().parse::<u64>() {
        Ok(ms) => Duration::from_millis(ms),
        Err(_) => {
            tracing::warn!(value = %raw, "invalid INGEST_FETCH_LATENCY_MS; using default");
            DEFAULT_LATENCY
        }
    }
}

#[async_trait::async_trait]
impl FetchWorker for SimulatedFetcher {
    async fn fetch(&self, id: i64) -> Result<serde_json::Value, WorkerError> {
        tokio::time::sleep(self.latency).await;
        Ok(serde_json::json!({ "id": id, "data": "processed" }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_processed_payload_after_latency() {
        let f = SimulatedFetcher::new(Duration::from_millis(5));
        let start = std::time::Instant::now();
        let v = f.fetch(42).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(5));
        assert_eq!(v["id"], 42);
        assert_eq!(v["data"], "processed");
    }

    #[test]
    fn latency_falls_back_to_default_on_bad_input() {
        assert_eq!(latency_from(None), DEFAULT_LATENCY);
        assert_eq!(latency_from(Some("250".into())), Duration::from_millis(250));
        assert_eq!(latency_from(Some("fast".into())), DEFAULT_LATENCY);
        assert_eq!(latency_from(Some("-1".into())), DEFAULT_LATENCY);
    }
}
