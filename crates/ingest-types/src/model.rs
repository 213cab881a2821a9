//! Ingestion and batch records, scheduling priority, and the in-memory job shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::IngestError;

/// Scheduling priority of an ingestion (and every batch it owns).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Numeric rank used for queue ordering; lower is extracted first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HIGH" => Ok(Priority::High),
            "MEDIUM" => Ok(Priority::Medium),
            "LOW" => Ok(Priority::Low),
            other => Err(IngestError::InvalidInput(format!(
                "invalid priority: {}",
                other
            ))),
        }
    }
}

/// Processing status of a batch (and, aggregated, of an ingestion).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    #[default]
    YetToStart,
    Triggered,
    Completed,
}

impl BatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BatchStatus::YetToStart => "yet_to_start",
            BatchStatus::Triggered => "triggered",
            BatchStatus::Completed => "completed",
        }
    }

    /// The only status this one may move to, if any.
    pub fn successor(self) -> Option<BatchStatus> {
        match self {
            BatchStatus::YetToStart => Some(BatchStatus::Triggered),
            BatchStatus::Triggered => Some(BatchStatus::Completed),
            BatchStatus::Completed => None,
        }
    }

    /// True when `next` is a legal single forward step from `self`.
    pub fn can_advance_to(self, next: BatchStatus) -> bool {
        self.successor() == Some(next)
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yet_to_start" => Ok(BatchStatus::YetToStart),
            "triggered" => Ok(BatchStatus::Triggered),
            "completed" => Ok(BatchStatus::Completed),
            other => Err(format!("unknown batch status: {}", other)),
        }
    }
}

/// One submitted ingestion request. Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingestion {
    pub ingestion_id: String,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    /// Batch ids in creation order.
    pub batch_refs: Vec<String>,
}

/// A fixed-size slice of an ingestion's identifiers; the unit of scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub batch_id: String,
    pub ingestion_id: String,
    pub ids: Vec<i64>,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: BatchStatus,
}

/// In-memory scheduling record for one pending batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub batch_id: String,
    pub ingestion_id: String,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub ids: Vec<i64>,
}

impl From<&Batch> for Job {
    fn from(b: &Batch) -> Self {
        Self {
            batch_id: b.batch_id.clone(),
            ingestion_id: b.ingestion_id.clone(),
            priority: b.priority,
            created_at: b.created_at,
            ids: b.ids.clone(),
        }
    }
}
