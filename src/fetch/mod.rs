// src/fetch/mod.rs - Page acquisition: fast HTTP tier and deep browser tier
pub mod chromium;
pub mod deep;
pub mod fast;

use crate::models::Result;
use async_trait::async_trait;
use std::time::Duration;

pub use chromium::ChromiumRenderer;
pub use deep::DeepFetcher;
pub use fast::FastFetcher;

/// A fully loaded page, however it was obtained.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// URL after redirects.
    pub final_url: String,
    pub html: String,
    /// HTTP status when the transport exposes one.
    pub status: Option<u16>,
}

/// Capability interface for the deep tier: navigate, wait for content,
/// hand back the rendered document. One concrete implementation per
/// engine; tests inject scripted ones.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str, timeout: Duration) -> Result<RenderedPage>;
}

/// Stands in when no browser is available. The fast tier keeps working;
/// deep fetches report a render failure instead.
pub struct NoopRenderer;

#[async_trait]
impl PageRenderer for NoopRenderer {
    async fn render(&self, _url: &str, _timeout: Duration) -> Result<RenderedPage> {
        Err("browser not available, running in HTTP-only mode".into())
    }
}

/// Small pool of desktop user agents; rotating between requests varies
/// the request fingerprint enough for the less determined blockers.
const USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:127.0) Gecko/20100101 Firefox/127.0",
];

pub fn pick_user_agent() -> &'static str {
    USER_AGENTS[fastrand::usize(..USER_AGENTS.len())]
}
