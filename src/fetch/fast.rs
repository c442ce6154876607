// src/fetch/fast.rs - Lightweight HTTP pass over a target site
use crate::extract::{EmailExtractor, LinkCollector};
use crate::fetch::pick_user_agent;
use crate::models::{EmailHit, Result, Tier};
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

/// Classification of the fast pass, deciding whether the deep tier runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FastOutcome {
    /// Page reachable and emails found.
    Resolved,
    /// Page reachable, nothing found. Deep tier re-checks, the content
    /// may be behind JavaScript.
    Empty,
    /// Non-2xx, timeout, or connection failure. Never fatal; the target
    /// routes to the deep tier instead.
    Blocked(String),
}

#[derive(Debug, Clone)]
pub struct FastScan {
    pub outcome: FastOutcome,
    pub emails: Vec<EmailHit>,
    /// First priority page the scan settled on, if any.
    pub contact_page: Option<String>,
    /// Priority pages worth re-rendering in the deep tier.
    pub priority_pages: Vec<String>,
}

pub struct FastFetcher {
    client: Client,
    extractor: EmailExtractor,
    collector: LinkCollector,
    max_pages: usize,
}

impl FastFetcher {
    pub fn new(timeout_secs: u64, max_pages: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(30)))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            extractor: EmailExtractor::new(),
            collector: LinkCollector::new(),
            max_pages,
        })
    }

    /// Fast pass over one target: GET the main page, scan it, then scan
    /// up to `max_pages` priority pages (contact/about/...). Individual
    /// sub-page failures are logged and skipped.
    pub async fn check(&self, target_url: &str) -> FastScan {
        debug!("Fast check: {}", target_url);

        let (main_html, main_url) = match self.fetch_page(target_url).await {
            Ok(page) => page,
            Err(e) => {
                debug!("Fast tier blocked on {}: {}", target_url, e);
                return FastScan {
                    outcome: FastOutcome::Blocked(e.to_string()),
                    emails: Vec::new(),
                    contact_page: None,
                    priority_pages: Vec::new(),
                };
            }
        };

        let mut emails = Vec::new();
        let mut seen = HashSet::new();
        collect_new(&mut emails, &mut seen, self.extractor.extract(&main_html, Tier::Fast, &main_url));

        let links = self.collector.internal_links(&main_html, &main_url);
        let mut priority_pages = LinkCollector::priority_pages(&links);
        priority_pages.truncate(self.max_pages);

        for page_url in &priority_pages {
            match self.fetch_page(page_url).await {
                Ok((html, final_url)) => {
                    collect_new(&mut emails, &mut seen, self.extractor.extract(&html, Tier::Fast, &final_url));
                }
                Err(e) => warn!("Priority page {} failed: {}", page_url, e),
            }
        }

        let outcome = if emails.is_empty() {
            FastOutcome::Empty
        } else {
            FastOutcome::Resolved
        };

        FastScan {
            outcome,
            emails,
            contact_page: priority_pages.first().cloned(),
            priority_pages,
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<(String, String)> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, pick_user_agent())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(format!("HTTP error: {}", response.status()).into());
        }

        let final_url = response.url().to_string();
        let html = response.text().await?;
        debug!("Fetched {} bytes from {}", html.len(), url);
        Ok((html, final_url))
    }
}

fn collect_new(emails: &mut Vec<EmailHit>, seen: &mut HashSet<String>, hits: Vec<EmailHit>) {
    for hit in hits {
        if seen.insert(hit.email.clone()) {
            emails.push(hit);
        }
    }
}
