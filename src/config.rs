use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub scan: ScanConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Concurrent fast-tier workers dequeuing targets.
    pub fast_workers: usize,
    /// Concurrent browser renders. Keep small; each render holds a page.
    pub deep_workers: usize,
    pub request_timeout_secs: u64,
    pub render_timeout_secs: u64,
    /// Settle time after navigation before the DOM is read.
    pub render_settle_ms: u64,
    /// Priority pages (contact/about/...) scanned per target.
    pub max_pages_per_domain: usize,
    pub max_emails_per_domain: usize,
    /// Deep-tier render attempts per target before it is marked failed.
    pub max_deep_retries: u32,
    pub retry_base_delay_ms: u64,
    /// Random delay added between deep attempts to vary request timing.
    pub retry_jitter_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    pub directory: String,
    /// Emit a row for failed/empty targets, not only for found emails.
    pub include_failed: bool,
    /// Pretty-print the JSON result dump next to the CSV.
    pub pretty_json: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Log a progress line every N completed targets.
    pub progress_interval: usize,
    /// Ask for confirmation before scanning more than this many targets.
    pub confirm_above: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan: ScanConfig {
                fast_workers: 8,
                deep_workers: 2,
                request_timeout_secs: 20,
                render_timeout_secs: 40,
                render_settle_ms: 3000,
                max_pages_per_domain: 5,
                max_emails_per_domain: 5,
                max_deep_retries: 2,
                retry_base_delay_ms: 1500,
                retry_jitter_ms: 1000,
            },
            report: ReportConfig {
                directory: "out".to_string(),
                include_failed: true,
                pretty_json: true,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                progress_interval: 10,
                confirm_above: 200,
            },
        }
    }
}

pub async fn load_config(
    path: &str,
) -> std::result::Result<Config, Box<dyn std::error::Error + Send + Sync>> {
    let content = tokio::fs::read_to_string(path).await?;
    let config: Config = serde_yaml::from_str(&content)?;
    Ok(config)
}
