use std::time::Duration;

const DEFAULT_BATCH_DELAY: Duration = Duration::from_secs(5);

/// Tunables for the drain loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Pause after each batch before the next extraction.
    pub batch_delay: Duration,
    /// Per-identifier limit on worker calls; `None` waits indefinitely.
    pub worker_timeout: Option<Duration>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            batch_delay: DEFAULT_BATCH_DELAY,
            worker_timeout: None,
        }
    }
}

impl SchedulerConfig {
    /// Read `INGEST_BATCH_DELAY_MS` and `INGEST_WORKER_TIMEOUT_MS`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(ms) = env_millis("INGEST_BATCH_DELAY_MS") {
            cfg.batch_delay = ms;
        }
        cfg.worker_timeout = env_millis("INGEST_WORKER_TIMEOUT_MS").filter(|d| !d.is_zero());
        cfg
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring non-numeric duration");
            None
        }
    }
}
