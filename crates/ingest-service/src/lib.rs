//! Ingestion orchestration: split, persist, enqueue, and report status.

mod config;
mod service;
mod splitter;
mod status;

pub use config::ServiceConfig;
pub use ingest_types::IngestError;
pub use service::IngestionService;
pub use splitter::split_into_batches;
pub use status::aggregate_status;
