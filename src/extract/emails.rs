// src/extract/emails.rs
use crate::models::{Confidence, EmailHit, Tier};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::debug;

pub struct EmailExtractor {
    email_regex: Regex,
    full_match: Regex,
    obfuscated_regex: Regex,
    cfemail_selector: Selector,
}

impl EmailExtractor {
    pub fn new() -> Self {
        Self {
            email_regex: Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,7}\b")
                .unwrap(),
            full_match: Regex::new(r"^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,7}$").unwrap(),
            // "name [at] domain [dot] tld" and the parenthesized variant
            obfuscated_regex: Regex::new(
                r"(?i)\b([a-z0-9._%+-]+)\s*(?:\[\s*at\s*\]|\(\s*at\s*\))\s*([a-z0-9.-]+)\s*(?:\[\s*dot\s*\]|\(\s*dot\s*\))\s*([a-z]{2,7})\b",
            )
            .unwrap(),
            cfemail_selector: Selector::parse("[data-cfemail]").unwrap(),
        }
    }

    /// Scan raw HTML for email addresses: plain regex matches, Cloudflare
    /// cfemail attributes, and textual "[at]/[dot]" spellings. Results are
    /// normalized and deduplicated; the first form found wins.
    pub fn extract(&self, html: &str, tier: Tier, source_url: &str) -> Vec<EmailHit> {
        let mut hits = Vec::new();
        let mut seen = HashSet::new();

        for m in self.email_regex.find_iter(html) {
            self.push_hit(&mut hits, &mut seen, m.as_str(), Confidence::Plain, tier, source_url);
        }

        for decoded in self.decode_cfemail_attrs(html) {
            self.push_hit(&mut hits, &mut seen, &decoded, Confidence::Obfuscated, tier, source_url);
        }

        for caps in self.obfuscated_regex.captures_iter(html) {
            let assembled = format!("{}@{}.{}", &caps[1], &caps[2], &caps[3]);
            self.push_hit(&mut hits, &mut seen, &assembled, Confidence::Obfuscated, tier, source_url);
        }

        debug!("Extracted {} emails from {}", hits.len(), source_url);
        hits
    }

    fn push_hit(
        &self,
        hits: &mut Vec<EmailHit>,
        seen: &mut HashSet<String>,
        raw: &str,
        confidence: Confidence,
        tier: Tier,
        source_url: &str,
    ) {
        let email = normalize_email(raw);
        if !self.full_match.is_match(&email) || is_junk_email(&email) {
            return;
        }
        if seen.insert(email.clone()) {
            hits.push(EmailHit {
                email,
                tier,
                confidence,
                source_url: source_url.to_string(),
            });
        }
    }

    /// Cloudflare obfuscation: hex string, first byte is the XOR key.
    fn decode_cfemail_attrs(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        document
            .select(&self.cfemail_selector)
            .filter_map(|el| el.value().attr("data-cfemail"))
            .filter_map(decode_cfemail)
            .collect()
    }
}

impl Default for EmailExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_cfemail(hex: &str) -> Option<String> {
    if hex.len() < 4 || hex.len() % 2 != 0 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let bytes: Vec<u8> = (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16))
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    let key = bytes[0];
    let decoded: Vec<u8> = bytes[1..].iter().map(|b| b ^ key).collect();
    String::from_utf8(decoded).ok()
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().trim_matches('.').to_lowercase()
}

/// Filters out matches that are file names, placeholders, or tracking
/// domains rather than reachable mailboxes.
pub fn is_junk_email(email: &str) -> bool {
    const FILE_EXTENSIONS: [&str; 8] = [
        ".jpg", ".jpeg", ".png", ".gif", ".pdf", ".zip", ".webp", ".svg",
    ];
    const JUNK_MARKERS: [&str; 8] = [
        "example.com",
        "test@",
        "demo@",
        "sample@",
        "placeholder@",
        "noreply@",
        "no-reply@",
        "donotreply@",
    ];
    const JUNK_DOMAINS: [&str; 2] = ["sentry.io", "wixpress.com"];

    FILE_EXTENSIONS.iter().any(|ext| email.contains(ext))
        || JUNK_MARKERS.iter().any(|m| email.contains(m))
        || JUNK_DOMAINS.iter().any(|d| email.ends_with(d))
}
