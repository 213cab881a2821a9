//! Pending-job queue ordered by priority rank, then creation time, then enqueue order.

use chrono::{DateTime, Utc};
use ingest_types::Job;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

struct Entry {
    rank: u8,
    created_at: DateTime<Utc>,
    seq: u64,
    job: Job,
}

impl Entry {
    fn key(&self) -> (u8, DateTime<Utc>, u64) {
        (self.rank, self.created_at, self.seq)
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // BinaryHeap is a max-heap; the smallest key must compare greatest.
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

/// Priority heap of pending jobs. Each batch id is held at most once.
#[derive(Default)]
pub struct JobQueue {
    heap: BinaryHeap<Entry>,
    queued: HashSet<String>,
    next_seq: u64,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a job. Returns `false` (and drops the job) if its batch is already queued.
    pub fn enqueue(&mut self, job: Job) -> bool {
        if !self.queued.insert(job.batch_id.clone()) {
            return false;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry {
            rank: job.priority.rank(),
            created_at: job.created_at,
            seq,
            job,
        });
        true
    }

    /// Remove and return the highest-priority, oldest job.
    pub fn extract_next(&mut self) -> Option<Job> {
        let entry = self.heap.pop()?;
        self.queued.remove(&entry.job.batch_id);
        Some(entry.job)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use ingest_types::Priority;

    fn job(batch_id: &str, priority: Priority, created_at: DateTime<Utc>) -> Job {
        Job {
            batch_id: batch_id.to_string(),
            ingestion_id: format!("ing-{}", batch_id),
            priority,
            created_at,
            ids: vec![1],
        }
    }

    fn drain(q: &mut JobQueue) -> Vec<String> {
        std::iter::from_fn(|| q.extract_next())
            .map(|j| j.batch_id)
            .collect()
    }

    #[test]
    fn empty_queue_yields_none() {
        let mut q = JobQueue::new();
        assert!(q.is_empty());
        assert!(q.extract_next().is_none());
    }

    #[test]
    fn higher_priority_wins_regardless_of_enqueue_order() {
        let t0 = Utc::now();
        let mut q = JobQueue::new();
        q.enqueue(job("low", Priority::Low, t0));
        q.enqueue(job("medium", Priority::Medium, t0 + Duration::seconds(1)));
        q.enqueue(job("high", Priority::High, t0 + Duration::seconds(2)));
        assert_eq!(drain(&mut q), vec!["high", "medium", "low"]);
    }

    #[test]
    fn equal_priority_is_fifo_by_creation_time() {
        let t0 = Utc::now();
        let mut q = JobQueue::new();
        q.enqueue(job("second", Priority::Medium, t0 + Duration::milliseconds(10)));
        q.enqueue(job("first", Priority::Medium, t0));
        assert_eq!(drain(&mut q), vec!["first", "second"]);
    }

    #[test]
    fn identical_timestamps_keep_enqueue_order() {
        let t0 = Utc::now();
        let mut q = JobQueue::new();
        for id in ["b0", "b1", "b2", "b3"] {
            q.enqueue(job(id, Priority::Low, t0));
        }
        assert_eq!(drain(&mut q), vec!["b0", "b1", "b2", "b3"]);
    }

    #[test]
    fn late_arrivals_are_ordered_against_remaining_jobs() {
        let t0 = Utc::now();
        let mut q = JobQueue::new();
        q.enqueue(job("m1", Priority::Medium, t0));
        q.enqueue(job("m2", Priority::Medium, t0));
        assert_eq!(q.extract_next().unwrap().batch_id, "m1");
        q.enqueue(job("h1", Priority::High, t0 + Duration::seconds(5)));
        assert_eq!(drain(&mut q), vec!["h1", "m2"]);
    }

    #[test]
    fn duplicate_batch_is_rejected_while_queued() {
        let t0 = Utc::now();
        let mut q = JobQueue::new();
        assert!(q.enqueue(job("b", Priority::High, t0)));
        assert!(!q.enqueue(job("b", Priority::Low, t0)));
        assert_eq!(q.len(), 1);
        q.extract_next();
        assert!(q.enqueue(job("b", Priority::High, t0)));
    }
}
