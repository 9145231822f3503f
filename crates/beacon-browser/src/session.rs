use crate::{Error, Result, user_agent::random_user_agent};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat,
};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Script injected before any page script runs, so the analysis service
/// does not see the automation marker.
const MASK_WEBDRIVER: &str =
    "Object.defineProperty(navigator, 'webdriver', {get: () => undefined})";

/// How to launch Chrome for one analysis session.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub chrome_path: Option<PathBuf>,
    pub headless: bool,
    /// None picks a random agent from the built-in pool.
    pub user_agent: Option<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            user_agent: None,
        }
    }
}

impl LaunchOptions {
    /// Chrome flags mirroring a clean, extensionless private session. The
    /// automation-controlled blink flag is what the upstream service keys
    /// its bot heuristics on.
    fn build_args(&self, user_agent: &str) -> Vec<String> {
        vec![
            "--incognito".to_string(),
            "--disable-extensions".to_string(),
            "--disable-plugins".to_string(),
            "--disable-default-apps".to_string(),
            "--disable-blink-features=AutomationControlled".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-gpu".to_string(),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            format!("--user-agent={}", user_agent),
        ]
    }
}

/// Result of a bounded poll for an in-page global.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Ready(serde_json::Value),
    /// The global never became non-null within the wait budget. A partial
    /// result, not a failure.
    TimedOut,
}

impl PollOutcome {
    pub fn into_value(self) -> Option<serde_json::Value> {
        match self {
            PollOutcome::Ready(value) => Some(value),
            PollOutcome::TimedOut => None,
        }
    }
}

/// One headless browser with a single page, driving the analysis site.
/// Sessions are single-target: the batch driver launches a fresh one per
/// URL so no state leaks between targets.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    pub async fn launch(options: &LaunchOptions) -> Result<Self> {
        let user_agent = options
            .user_agent
            .clone()
            .unwrap_or_else(|| random_user_agent().to_string());
        tracing::debug!(%user_agent, headless = options.headless, "launching browser");

        let mut builder = BrowserConfig::builder().args(options.build_args(&user_agent));
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(ref path) = options.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(Error::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await?;

        // The handler stream must be pumped for any CDP command to resolve.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("CDP handler event error (continuing): {}", e);
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        page.execute(
            AddScriptToEvaluateOnNewDocumentParams::builder()
                .source(MASK_WEBDRIVER)
                .build()
                .map_err(Error::Cdp)?,
        )
        .await?;

        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    /// Load a URL and wait for the navigation to settle.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        tracing::info!(%url, "navigating");
        self.page.goto(url).await?;
        // Best effort; the analysis page keeps loading data long after the
        // navigation event anyway.
        let _ = self.page.wait_for_navigation().await;
        Ok(())
    }

    /// Evaluate a script expression and return its JSON value. Expressions
    /// that evaluate to undefined come back as null.
    pub async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        let result = self.page.evaluate(script).await?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    /// Poll an expression at a fixed interval until it is non-null or the
    /// wait budget is spent. Evaluation errors while the page is still
    /// loading count as "not ready", not as failures.
    pub async fn poll_non_null(
        &self,
        expr: &str,
        interval: Duration,
        max_wait: Duration,
    ) -> Result<PollOutcome> {
        let deadline = tokio::time::Instant::now() + max_wait;
        loop {
            match self.evaluate(expr).await {
                Ok(value) if !value.is_null() => return Ok(PollOutcome::Ready(value)),
                Ok(_) => {}
                Err(e) => tracing::debug!("poll evaluation not ready: {}", e),
            }
            if tokio::time::Instant::now() >= deadline {
                tracing::warn!(%expr, ?max_wait, "poll timed out, proceeding with what we have");
                return Ok(PollOutcome::TimedOut);
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// The page's current URL, after any redirects.
    pub async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    /// Resize the viewport and save a full-page PNG of the scrollable page.
    pub async fn capture_full_page(
        &self,
        path: &Path,
        width: u32,
        height: u32,
        mobile: bool,
    ) -> Result<()> {
        let metrics = SetDeviceMetricsOverrideParams::builder()
            .width(width as i64)
            .height(height as i64)
            .device_scale_factor(1.0)
            .mobile(mobile)
            .build()
            .map_err(Error::Cdp)?;
        self.page.execute(metrics).await?;

        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.page.save_screenshot(params, path).await?;
        tracing::info!(path = %path.display(), width, height, "saved full-page screenshot");
        Ok(())
    }

    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await?;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args_carry_anti_automation_profile() {
        let options = LaunchOptions::default();
        let args = options.build_args("test-agent/1.0");

        assert!(args.contains(&"--incognito".to_string()));
        assert!(args.contains(&"--disable-blink-features=AutomationControlled".to_string()));
        assert!(args.contains(&"--user-agent=test-agent/1.0".to_string()));
    }

    #[test]
    fn test_default_options_are_headless_with_random_agent() {
        let options = LaunchOptions::default();
        assert!(options.headless);
        assert!(options.user_agent.is_none());
        assert!(options.chrome_path.is_none());
    }

    #[test]
    fn test_poll_outcome_into_value() {
        assert_eq!(
            PollOutcome::Ready(serde_json::json!(1)).into_value(),
            Some(serde_json::json!(1))
        );
        assert_eq!(PollOutcome::TimedOut.into_value(), None);
    }

    // Poll/navigation behavior against a live page is exercised by the
    // run command; it needs a local Chrome install.
}
