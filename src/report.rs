// src/report.rs - Spreadsheet artifact for a finished job
use crate::models::{JobReport, Result};
use std::io::Write;

const HEADER: &str = "url,email,tier,confidence,status,contact_page,scanned_at";

pub struct ReportWriter {
    include_failed: bool,
    pretty_json: bool,
}

impl ReportWriter {
    pub fn new(include_failed: bool, pretty_json: bool) -> Self {
        Self {
            include_failed,
            pretty_json,
        }
    }

    /// Write the finished result set as CSV. One row per (target, email);
    /// targets without emails still get a row so nothing silently drops
    /// out of the tally.
    pub async fn write_csv(&self, report: &JobReport, filename: &str) -> Result<()> {
        if let Some(parent) = std::path::Path::new(filename).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = std::fs::File::create(filename)?;
        writeln!(file, "{}", HEADER)?;

        let scanned_at = report.finished_at.format("%Y-%m-%d %H:%M:%S").to_string();

        for target in &report.targets {
            let contact_page = target.contact_page.as_deref().unwrap_or("");
            let status = format!("{:?}", target.status).to_lowercase();

            if target.emails.is_empty() {
                if self.include_failed {
                    writeln!(
                        file,
                        "{},,,,{},{},{}",
                        csv_field(&target.url),
                        csv_field(&format!("{} ({})", status, target.status_note)),
                        csv_field(contact_page),
                        scanned_at
                    )?;
                }
                continue;
            }

            for hit in &target.emails {
                writeln!(
                    file,
                    "{},{},{},{},{},{},{}",
                    csv_field(&target.url),
                    csv_field(&hit.email),
                    hit.tier,
                    hit.confidence,
                    csv_field(&format!("{} ({})", status, target.status_note)),
                    csv_field(contact_page),
                    scanned_at
                )?;
            }
        }

        for entry in &report.skipped {
            writeln!(
                file,
                "{},,,,{},,{}",
                csv_field(&entry.line),
                csv_field(&format!("skipped ({})", entry.reason)),
                scanned_at
            )?;
        }

        Ok(())
    }

    /// Machine-readable dump of the full result set, skipped entries and all.
    pub async fn write_json(&self, report: &JobReport, filename: &str) -> Result<()> {
        if let Some(parent) = std::path::Path::new(filename).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = if self.pretty_json {
            serde_json::to_string_pretty(report)?
        } else {
            serde_json::to_string(report)?
        };
        tokio::fs::write(filename, json).await?;

        Ok(())
    }

    /// Closing summary in the shape of the final stats message.
    pub fn summary(&self, report: &JobReport, csv_path: &str) -> String {
        format!(
            "\n✅ Scan finished ({:?})\n\
             ═══════════════════════════════════\n\
             • Sites scanned:     {}\n\
             • Sites with emails: {}\n\
             • Emails found:      {}\n\
             • Failed sites:      {}\n\
             • Skipped entries:   {}\n\
             📁 Report: {}",
            report.status,
            report.targets.len(),
            report.sites_with_emails(),
            report.total_emails(),
            report.failed_targets(),
            report.skipped.len(),
            csv_path
        )
    }
}

/// Quote a field when it carries a delimiter; plain otherwise.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Confidence, EmailHit, JobStatus, SkippedEntry, TargetReport, TargetStatus, Tier,
    };
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_report() -> JobReport {
        JobReport {
            job_id: Uuid::new_v4(),
            status: JobStatus::PartialFailure,
            targets: vec![
                TargetReport {
                    target_id: Uuid::new_v4(),
                    url: "http://a.example/".to_string(),
                    status: TargetStatus::Done,
                    emails: vec![EmailHit {
                        email: "anna@a.example".to_string(),
                        tier: Tier::Fast,
                        confidence: Confidence::Plain,
                        source_url: "http://a.example/contact".to_string(),
                    }],
                    contact_page: Some("http://a.example/contact".to_string()),
                    status_note: "resolved via fast tier".to_string(),
                },
                TargetReport {
                    target_id: Uuid::new_v4(),
                    url: "http://c.example/".to_string(),
                    status: TargetStatus::Failed,
                    emails: Vec::new(),
                    contact_page: None,
                    status_note: "unreachable after 3 render attempts".to_string(),
                },
            ],
            skipped: vec![SkippedEntry {
                line: "ftp://nope".to_string(),
                reason: "unsupported scheme 'ftp'".to_string(),
            }],
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
    }

    fn temp_csv() -> String {
        std::env::temp_dir()
            .join(format!("harvest_report_{}.csv", Uuid::new_v4()))
            .to_string_lossy()
            .into_owned()
    }

    #[tokio::test]
    async fn writes_one_row_per_email_plus_failure_rows() {
        let path = temp_csv();
        ReportWriter::new(true, true)
            .write_csv(&sample_report(), &path)
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], HEADER);
        // 1 email row + 1 failed row + 1 skipped row
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("anna@a.example"));
        assert!(lines[1].contains("fast"));
        assert!(lines[2].contains("failed"));
        assert!(lines[3].contains("skipped"));

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn can_suppress_empty_targets() {
        let path = temp_csv();
        ReportWriter::new(false, false)
            .write_csv(&sample_report(), &path)
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        // Header, email row, skipped row; the failed target row is gone.
        assert_eq!(content.lines().count(), 3);

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn json_dump_round_trips() {
        let path = std::env::temp_dir()
            .join(format!("harvest_report_{}.json", Uuid::new_v4()))
            .to_string_lossy()
            .into_owned();
        let report = sample_report();
        ReportWriter::new(true, true)
            .write_json(&report, &path)
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["targets"].as_array().unwrap().len(), 2);
        assert_eq!(parsed["skipped"][0]["reason"], "unsupported scheme 'ftp'");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn fields_with_commas_get_quoted() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn summary_mentions_the_tallies() {
        let report = sample_report();
        let text = ReportWriter::new(true, true).summary(&report, "out/report.csv");
        assert!(text.contains("Sites scanned:     2"));
        assert!(text.contains("Emails found:      1"));
        assert!(text.contains("Failed sites:      1"));
        assert!(text.contains("out/report.csv"));
    }
}
