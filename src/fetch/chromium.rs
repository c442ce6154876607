// src/fetch/chromium.rs - Headless-Chromium implementation of PageRenderer
use crate::fetch::{pick_user_agent, PageRenderer, RenderedPage};
use crate::models::Result;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Locate a Chromium binary: explicit env override first, then PATH.
pub fn find_chromium() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
        warn!("CHROMIUM_PATH set but {} does not exist", p);
    }

    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    None
}

/// Deep-tier renderer. One browser process is shared across the scan;
/// each render opens and closes its own page.
pub struct ChromiumRenderer {
    browser: Browser,
    settle: Duration,
}

impl ChromiumRenderer {
    pub async fn launch(settle_ms: u64) -> Result<Self> {
        let chrome_path = find_chromium().ok_or("no Chromium binary found")?;
        info!("🌐 Launching headless Chromium from {:?}", chrome_path);

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking")
            // Sites with broken certs still get scanned, matching the
            // lenient fast-tier behavior.
            .arg("--ignore-certificate-errors")
            .arg(format!("--user-agent={}", pick_user_agent()))
            .build()
            .map_err(|e| format!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config).await?;

        // The handler stream must be drained for the browser to make progress.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self {
            browser,
            settle: Duration::from_millis(settle_ms),
        })
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn render(&self, url: &str, timeout: Duration) -> Result<RenderedPage> {
        let page = self.browser.new_page("about:blank").await?;

        let result = async {
            match tokio::time::timeout(timeout, page.goto(url)).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => return Err(format!("navigation failed: {e}").into()),
                Err(_) => return Err(format!("navigation timed out after {:?}", timeout).into()),
            }

            // Give scripts time to inject the content we came for.
            tokio::time::sleep(self.settle).await;

            let html = page.content().await?;
            let final_url = page
                .url()
                .await
                .unwrap_or_default()
                .map(|u| u.to_string())
                .unwrap_or_else(|| url.to_string());

            debug!("Rendered {} bytes from {}", html.len(), url);
            Ok(RenderedPage {
                final_url,
                html,
                status: None,
            })
        }
        .await;

        let _ = page.close().await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires a local Chromium install
    async fn renders_a_data_url() {
        let renderer = ChromiumRenderer::launch(100)
            .await
            .expect("failed to launch Chromium");

        let page = renderer
            .render(
                "data:text/html,<p>boss@firma.example</p>",
                Duration::from_secs(10),
            )
            .await
            .expect("render failed");

        assert!(page.html.contains("boss@firma.example"));
    }
}
