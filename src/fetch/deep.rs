// src/fetch/deep.rs - Browser-rendered fallback with bounded retries
use crate::extract::{EmailExtractor, LinkCollector};
use crate::fetch::PageRenderer;
use crate::models::{EmailHit, Tier};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct DeepScan {
    pub emails: Vec<EmailHit>,
    pub contact_page: Option<String>,
    /// Render attempts spent on the main page.
    pub attempts: u32,
    /// Set when every attempt failed; the target is then marked failed.
    pub error: Option<String>,
}

/// Deep-tier policy around a `PageRenderer`: bounded retries with jittered
/// backoff between attempts, then the same main-page-plus-priority-pages
/// sweep the fast tier does, on the rendered DOM.
pub struct DeepFetcher {
    renderer: Arc<dyn PageRenderer>,
    extractor: EmailExtractor,
    collector: LinkCollector,
    timeout: Duration,
    max_retries: u32,
    base_delay_ms: u64,
    jitter_ms: u64,
    max_pages: usize,
}

impl DeepFetcher {
    pub fn new(
        renderer: Arc<dyn PageRenderer>,
        timeout_secs: u64,
        max_retries: u32,
        base_delay_ms: u64,
        jitter_ms: u64,
        max_pages: usize,
    ) -> Self {
        Self {
            renderer,
            extractor: EmailExtractor::new(),
            collector: LinkCollector::new(),
            timeout: Duration::from_secs(timeout_secs),
            max_retries,
            base_delay_ms,
            jitter_ms,
            max_pages,
        }
    }

    /// Render and re-scan a target the fast tier could not resolve.
    /// `known_pages` carries priority pages the fast tier already
    /// discovered, used when the rendered main page cannot be loaded
    /// for link collection.
    pub async fn scan(&self, target_url: &str, known_pages: &[String]) -> DeepScan {
        let mut attempts = 0;
        let mut last_error = String::new();

        let (main_html, main_url) = loop {
            attempts += 1;
            match self.renderer.render(target_url, self.timeout).await {
                Ok(page) => break (page.html, page.final_url),
                Err(e) => {
                    last_error = e.to_string();
                    debug!(
                        "Deep render attempt {}/{} failed for {}: {}",
                        attempts,
                        self.max_retries + 1,
                        target_url,
                        last_error
                    );
                    if attempts > self.max_retries {
                        return DeepScan {
                            emails: Vec::new(),
                            contact_page: known_pages.first().cloned(),
                            attempts,
                            error: Some(last_error),
                        };
                    }
                    self.backoff(attempts).await;
                }
            }
        };

        let mut emails = Vec::new();
        let mut seen = HashSet::new();
        collect_new(&mut emails, &mut seen, self.extractor.extract(&main_html, Tier::Deep, &main_url));

        let mut pages = LinkCollector::priority_pages(&self.collector.internal_links(&main_html, &main_url));
        if pages.is_empty() {
            pages = known_pages.to_vec();
        }
        pages.truncate(self.max_pages);

        for page_url in &pages {
            // Sub-page render failures are not retried; the main page
            // already answered for reachability.
            match self.renderer.render(page_url, self.timeout).await {
                Ok(page) => {
                    collect_new(&mut emails, &mut seen, self.extractor.extract(&page.html, Tier::Deep, &page.final_url));
                }
                Err(e) => warn!("Deep render of {} failed: {}", page_url, e),
            }
            self.backoff(1).await;
        }

        DeepScan {
            emails,
            contact_page: pages.first().cloned(),
            attempts,
            error: None,
        }
    }

    /// Randomized wait between renders; varies timing so consecutive
    /// requests against one site do not land in lockstep.
    async fn backoff(&self, attempt: u32) {
        let jitter = if self.jitter_ms > 0 {
            fastrand::u64(0..=self.jitter_ms)
        } else {
            0
        };
        let delay = self.base_delay_ms * u64::from(attempt) + jitter;
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

fn collect_new(emails: &mut Vec<EmailHit>, seen: &mut HashSet<String>, hits: Vec<EmailHit>) {
    for hit in hits {
        if seen.insert(hit.email.clone()) {
            emails.push(hit);
        }
    }
}
