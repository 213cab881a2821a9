const DEFAULT_BATCH_SIZE: usize = 3;

/// Tunables for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Maximum number of identifiers per batch.
    pub batch_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl ServiceConfig {
    /// Read `INGEST_BATCH_SIZE` (must be at least 1).
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(raw) = std::env::var("INGEST_BATCH_SIZE") {
            match raw.trim().parse::<usize>() {
                Ok(n) if n >= 1 => cfg.batch_size = n,
                _ => tracing::warn!(value = %raw, "invalid INGEST_BATCH_SIZE; using default"),
            }
        }
        cfg
    }
}
