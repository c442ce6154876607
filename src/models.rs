use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Which fetch tier discovered an email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "fast")]
    Fast,
    #[serde(rename = "deep")]
    Deep,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Fast => write!(f, "fast"),
            Tier::Deep => write!(f, "deep"),
        }
    }
}

/// How the address appeared on the page: written out in plain text, or
/// recovered from an obfuscation scheme (cfemail, "[at]/[dot]" spelling).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    #[serde(rename = "plain")]
    Plain,
    #[serde(rename = "obfuscated")]
    Obfuscated,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::Plain => write!(f, "plain"),
            Confidence::Obfuscated => write!(f, "obfuscated"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailHit {
    /// Normalized (lowercased, trailing dots stripped) address.
    pub email: String,
    pub tier: Tier,
    pub confidence: Confidence,
    /// Page the address was found on.
    pub source_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetStatus {
    Pending,
    FastChecked,
    DeepChecked,
    Done,
    Failed,
}

/// One URL under scan within a ScanJob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: Uuid,
    /// Normalized URL (scheme defaulted, fragment stripped, host lowercased).
    pub url: String,
    pub status: TargetStatus,
    pub retries: u32,
}

impl Target {
    pub fn new(url: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            url,
            status: TargetStatus::Pending,
            retries: 0,
        }
    }
}

/// A line from the input file that never became a Target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub line: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    InProgress,
    Completed,
    PartialFailure,
}

/// Final per-target outcome handed to the report writer.
#[derive(Debug, Clone, Serialize)]
pub struct TargetReport {
    pub target_id: Uuid,
    pub url: String,
    pub status: TargetStatus,
    pub emails: Vec<EmailHit>,
    /// Priority page (contact/about/...) the scan settled on, if any.
    pub contact_page: Option<String>,
    /// Human-readable outcome, mirrored into the spreadsheet.
    pub status_note: String,
}

/// The finished result set for one ScanJob.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub targets: Vec<TargetReport>,
    pub skipped: Vec<SkippedEntry>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl JobReport {
    pub fn total_emails(&self) -> usize {
        self.targets.iter().map(|t| t.emails.len()).sum()
    }

    pub fn sites_with_emails(&self) -> usize {
        self.targets.iter().filter(|t| !t.emails.is_empty()).count()
    }

    pub fn failed_targets(&self) -> usize {
        self.targets
            .iter()
            .filter(|t| t.status == TargetStatus::Failed)
            .count()
    }
}
