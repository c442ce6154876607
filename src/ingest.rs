// src/ingest.rs - URL list parsing and normalization
use crate::models::{SkippedEntry, Target};
use crate::queue::TargetQueue;
use tracing::{debug, warn};
use url::Url;

/// Outcome of parsing one input file: a seeded queue plus the lines that
/// never became targets. Malformed entries are reported, not fatal.
pub struct IngestResult {
    pub targets: Vec<Target>,
    pub skipped: Vec<SkippedEntry>,
}

/// Parse a URL list, one URL per line. Blank lines and `#` comments are
/// ignored; bare domains get an `http://` scheme; everything else must
/// parse as an http(s) URL or ends up in `skipped`.
pub fn parse_url_list(content: &str) -> IngestResult {
    let mut targets = Vec::new();
    let mut skipped = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match normalize_url(line) {
            Ok(url) => targets.push(Target::new(url)),
            Err(reason) => {
                warn!("Skipping entry '{}': {}", line, reason);
                skipped.push(SkippedEntry {
                    line: line.to_string(),
                    reason,
                });
            }
        }
    }

    debug!(
        "Parsed {} targets, {} skipped entries",
        targets.len(),
        skipped.len()
    );
    IngestResult { targets, skipped }
}

/// Normalize a raw entry into a canonical URL string: default the scheme,
/// lowercase the host (the url crate does this on parse), drop the fragment.
pub fn normalize_url(raw: &str) -> std::result::Result<String, String> {
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    };

    let mut url = Url::parse(&candidate).map_err(|e| e.to_string())?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme '{}'", other)),
    }
    if url.host_str().is_none() {
        return Err("no host".to_string());
    }

    url.set_fragment(None);
    Ok(url.to_string())
}

/// Seed a job queue from parsed targets. Duplicates collapse here; the
/// returned count is the number of unique targets actually queued.
pub async fn seed_queue(queue: &TargetQueue, targets: Vec<Target>) -> usize {
    let mut queued = 0;
    for target in targets {
        if queue.push(target).await {
            queued += 1;
        }
    }
    queued
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_scheme_for_bare_domains() {
        assert_eq!(normalize_url("example.com").unwrap(), "http://example.com/");
        assert_eq!(
            normalize_url("https://example.com").unwrap(),
            "https://example.com/"
        );
    }

    #[test]
    fn strips_fragments_and_lowercases_host() {
        assert_eq!(
            normalize_url("http://Example.COM/About#team").unwrap(),
            "http://example.com/About"
        );
    }

    #[test]
    fn rejects_garbage_and_non_http_schemes() {
        assert!(normalize_url("ht!tp://???").is_err());
        assert!(normalize_url("ftp://example.com").is_err());
        assert!(normalize_url("mailto:someone@example.com").is_err());
    }

    #[test]
    fn malformed_lines_become_skipped_entries() {
        let input = "example.com\n\n# comment\nftp://nope.com\nother.org\n";
        let result = parse_url_list(input);
        assert_eq!(result.targets.len(), 2);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].line, "ftp://nope.com");
    }

    #[tokio::test]
    async fn seeding_collapses_duplicates() {
        let queue = TargetQueue::new();
        let result = parse_url_list("a.com\nhttp://a.com\nb.com\n");
        // "a.com" and "http://a.com" normalize to the same URL.
        let queued = seed_queue(&queue, result.targets).await;
        assert_eq!(queued, 2);
    }
}
