use super::{PageFetcher, USER_AGENT};
use crate::error::{Result, ScrapeError};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptionsBuilder};
use std::ffi::OsStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// A pool of independent headless Chrome sessions, handed out round-robin.
/// Every fetch gets its own tab, which is closed once the DOM has been read.
pub struct ChromeFetcher {
    browsers: Vec<Browser>,
    next: AtomicUsize,
    navigation_timeout: Duration,
}

fn browser_err(e: impl std::fmt::Display) -> ScrapeError {
    ScrapeError::Browser(e.to_string())
}

impl ChromeFetcher {
    /// Launches `sessions` browsers, one per worker.
    pub fn launch(sessions: usize) -> Result<Self> {
        let user_agent = format!("--user-agent={}", USER_AGENT);
        let mut browsers = Vec::with_capacity(sessions.max(1));

        for _ in 0..sessions.max(1) {
            let options = LaunchOptionsBuilder::default()
                .headless(true)
                .args(vec![
                    OsStr::new("--disable-gpu"),
                    OsStr::new("--no-sandbox"),
                    OsStr::new("--window-size=1920,1080"),
                    OsStr::new(user_agent.as_str()),
                ])
                .idle_browser_timeout(Duration::from_secs(120))
                .build()
                .map_err(browser_err)?;

            browsers.push(Browser::new(options).map_err(browser_err)?);
        }
        info!("Launched {} headless Chrome sessions", browsers.len());

        Ok(Self {
            browsers,
            next: AtomicUsize::new(0),
            navigation_timeout: Duration::from_secs(45),
        })
    }

    fn fetch_blocking(browser: &Browser, url: &str, timeout: Duration) -> Result<String> {
        let tab = browser.new_tab().map_err(browser_err)?;
        tab.set_default_timeout(timeout);

        let content = tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .and_then(|tab| tab.get_content());

        // Close even when navigation failed
        let _ = tab.close(true);

        content.map_err(browser_err)
    }
}

#[async_trait]
impl PageFetcher for ChromeFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        debug!("Navigating to {}", url);
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.browsers.len();
        let browser = self.browsers[index].clone();
        let url = url.to_string();
        let timeout = self.navigation_timeout;

        tokio::task::spawn_blocking(move || Self::fetch_blocking(&browser, &url, timeout))
            .await
            .map_err(|e| ScrapeError::Other(e.to_string()))?
    }
}
