pub mod aggregator;
pub mod pipeline;

use crate::ingest;
use crate::models::SkippedEntry;
use crate::queue::TargetQueue;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

pub use pipeline::{ProgressCallback, ScanPipeline};

/// One submitted batch of targets plus its queue. Jobs are fully
/// isolated from each other: cancelling one cannot touch another.
pub struct ScanJob {
    pub id: Uuid,
    pub queue: Arc<TargetQueue>,
    pub total_targets: usize,
    pub skipped: Vec<SkippedEntry>,
    pub started_at: DateTime<Utc>,
}

impl ScanJob {
    /// Build a job from a raw URL list. Malformed lines end up in
    /// `skipped`; duplicates collapse into a single target.
    pub async fn from_url_list(content: &str) -> Self {
        let parsed = ingest::parse_url_list(content);
        let queue = Arc::new(TargetQueue::new());
        let total_targets = ingest::seed_queue(&queue, parsed.targets).await;

        Self {
            id: Uuid::new_v4(),
            queue,
            total_targets,
            skipped: parsed.skipped,
            started_at: Utc::now(),
        }
    }

    /// Stop handing out new targets; in-flight fetches drain.
    pub fn cancel(&self) {
        self.queue.cancel();
    }
}
