//! HTTP surface for the batch ingestion service.

pub mod config;
pub mod server;
