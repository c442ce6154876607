// src/queue.rs - Per-job target queue with dedup and cancellation
use crate::models::Target;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

/// The one piece of mutable state shared between scan workers.
///
/// Each ScanJob owns its own queue, so cancelling one job cannot touch
/// another. Dedup happens at push time against normalized URLs: the same
/// URL submitted twice within a job yields exactly one target.
pub struct TargetQueue {
    pending: Mutex<VecDeque<Target>>,
    seen: Mutex<HashSet<String>>,
    cancelled: AtomicBool,
}

impl TargetQueue {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            seen: Mutex::new(HashSet::new()),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Enqueue a target unless its URL was already seen in this job.
    /// Returns false for duplicates.
    pub async fn push(&self, target: Target) -> bool {
        let mut seen = self.seen.lock().await;
        if !seen.insert(target.url.clone()) {
            debug!("Duplicate target skipped: {}", target.url);
            return false;
        }
        drop(seen);

        let mut pending = self.pending.lock().await;
        pending.push_back(target);
        true
    }

    /// Dequeue the next pending target. Returns None when the queue is
    /// drained or the job has been cancelled.
    pub async fn pop(&self) -> Option<Target> {
        if self.is_cancelled() {
            return None;
        }
        let mut pending = self.pending.lock().await;
        pending.pop_front()
    }

    /// Stop handing out work. In-flight fetches drain on their own.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }
}

impl Default for TargetQueue {
    fn default() -> Self {
        Self::new()
    }
}
