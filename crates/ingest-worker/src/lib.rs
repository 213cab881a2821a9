//! Fetch workers: process one identifier against the external system.

mod http;
#[cfg(feature = "test-util")]
pub mod mock;
mod simulated;

pub use http::HttpFetcher;
pub use ingest_types::{FetchWorker, WorkerError};
pub use simulated::SimulatedFetcher;

#[cfg(feature = "test-util")]
pub use mock::{FailingWorker, RecordingWorker};
