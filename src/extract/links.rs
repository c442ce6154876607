// src/extract/links.rs
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

const IGNORE_EXTENSIONS: [&str; 12] = [
    ".jpg", ".jpeg", ".png", ".gif", ".pdf", ".zip", ".rar", ".css", ".js", ".xml", ".svg",
    ".webp",
];

const IGNORE_KEYWORDS: [&str; 9] = [
    "login",
    "signin",
    "register",
    "cart",
    "checkout",
    "my-account",
    "tel:",
    "mailto:",
    "javascript:",
];

/// Pages most likely to carry an address, checked first.
const PRIORITY_CONTACT: [&str; 5] = ["contact", "kontakty", "contatti", "kontakt", "contacts"];

/// Fallback pages when no contact page exists.
const PRIORITY_SECONDARY: [&str; 7] = [
    "about", "team", "staff", "imprint", "legal", "feedback", "company",
];

pub struct LinkCollector {
    link_selector: Selector,
}

impl LinkCollector {
    pub fn new() -> Self {
        Self {
            link_selector: Selector::parse("a[href]").unwrap(),
        }
    }

    /// Collect unique same-host links from a page, skipping assets and
    /// account/cart pages. Fragments are dropped so anchors collapse.
    pub fn internal_links(&self, html: &str, base_url: &str) -> Vec<String> {
        let base = match Url::parse(base_url) {
            Ok(url) => url,
            Err(_) => return Vec::new(),
        };
        let base_host = match base.host_str() {
            Some(host) => host.to_string(),
            None => return Vec::new(),
        };

        let document = Html::parse_document(html);
        let mut links = HashSet::new();

        for element in document.select(&self.link_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let href_lower = href.to_lowercase();
            if href.is_empty() || IGNORE_KEYWORDS.iter().any(|k| href_lower.contains(k)) {
                continue;
            }
            if IGNORE_EXTENSIONS.iter().any(|ext| href_lower.ends_with(ext)) {
                continue;
            }

            let Ok(mut resolved) = base.join(href) else {
                continue;
            };
            resolved.set_fragment(None);

            let same_host = resolved
                .host_str()
                .map(|h| h == base_host)
                .unwrap_or(false);
            if same_host {
                links.insert(resolved.to_string());
            }
        }

        let mut links: Vec<String> = links.into_iter().collect();
        links.sort();
        debug!("Collected {} internal links from {}", links.len(), base_url);
        links
    }

    /// Pick the pages worth a dedicated scan: contact pages when present,
    /// otherwise about/team/imprint pages.
    pub fn priority_pages(links: &[String]) -> Vec<String> {
        let contact: Vec<String> = links
            .iter()
            .filter(|l| {
                let lower = l.to_lowercase();
                PRIORITY_CONTACT.iter().any(|k| lower.contains(k))
            })
            .cloned()
            .collect();
        if !contact.is_empty() {
            return contact;
        }

        links
            .iter()
            .filter(|l| {
                let lower = l.to_lowercase();
                PRIORITY_SECONDARY.iter().any(|k| lower.contains(k))
            })
            .cloned()
            .collect()
    }
}

impl Default for LinkCollector {
    fn default() -> Self {
        Self::new()
    }
}
