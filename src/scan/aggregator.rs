// src/scan/aggregator.rs - Per-target merge and job rollup
use crate::models::{
    EmailHit, JobReport, JobStatus, SkippedEntry, TargetReport, TargetStatus,
};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct MergedEmails {
    pub hits: Vec<EmailHit>,
    /// True when the per-domain cap cut the list short.
    pub capped: bool,
}

/// Merge fast-tier and deep-tier hits for one target. Fast hits come
/// first so a doubly-discovered address keeps its fast-tier provenance,
/// which also makes the merged set a superset of the fast-only set until
/// the cap applies.
pub fn merge_hits(fast: Vec<EmailHit>, deep: Vec<EmailHit>, cap: usize) -> MergedEmails {
    let mut seen = HashSet::new();
    let mut hits = Vec::new();

    for hit in fast.into_iter().chain(deep) {
        if seen.insert(hit.email.clone()) {
            hits.push(hit);
        }
    }

    let capped = cap > 0 && hits.len() > cap;
    if capped {
        hits.truncate(cap);
    }
    MergedEmails { hits, capped }
}

/// Collects finished targets for one job. A target reaches a terminal
/// status exactly once; a second report for the same target is a bug in
/// the pipeline and gets dropped loudly.
pub struct Aggregator {
    terminal: HashSet<Uuid>,
    reports: Vec<TargetReport>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self {
            terminal: HashSet::new(),
            reports: Vec::new(),
        }
    }

    pub fn record(&mut self, report: TargetReport) -> bool {
        if !self.terminal.insert(report.target_id) {
            warn!("Target {} reported terminal twice, dropping", report.url);
            return false;
        }
        self.reports.push(report);
        true
    }

    pub fn into_report(
        self,
        job_id: Uuid,
        skipped: Vec<SkippedEntry>,
        total_targets: usize,
        started_at: DateTime<Utc>,
    ) -> JobReport {
        let status = rollup_status(&self.reports, &skipped, total_targets);
        JobReport {
            job_id,
            status,
            targets: self.reports,
            skipped,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// A job only counts as completed when every queued target reached
/// `Done` and nothing was skipped at ingest. Anything else, including a
/// cancellation that left targets unprocessed, is a partial failure.
fn rollup_status(
    reports: &[TargetReport],
    skipped: &[SkippedEntry],
    total_targets: usize,
) -> JobStatus {
    let all_reported = reports.len() == total_targets;
    let any_failed = reports.iter().any(|r| r.status == TargetStatus::Failed);

    if all_reported && !any_failed && skipped.is_empty() {
        JobStatus::Completed
    } else {
        JobStatus::PartialFailure
    }
}
