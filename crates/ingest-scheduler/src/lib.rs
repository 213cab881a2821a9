//! Batch scheduler: priority job queue plus one background drain loop.

mod config;
mod memory;
mod queue;
mod trait_;

pub use config::SchedulerConfig;
pub use memory::InMemoryScheduler;
pub use queue::JobQueue;
pub use trait_::{Scheduler, SchedulerError, SchedulerState};
