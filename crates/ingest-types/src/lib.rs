//! Core types and traits for the batch ingestion service.
//!
//! Request/response DTOs match the `/ingest` and `/status/{id}` JSON shapes.

mod dto;
mod model;
mod traits;

pub use dto::*;
pub use model::*;
pub use traits::*;
