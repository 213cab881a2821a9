//! Batch store implementations.

mod memory;

#[cfg(feature = "sqlite")]
mod sqlite;

pub use ingest_types::{Batch, BatchStatus, BatchStore, Ingestion, Priority, StoreError};
pub use memory::InMemoryBatchStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBatchStore;
