use anyhow::{Context, Result, bail};
use beacon_browser::{BrowserSession, LaunchOptions, PollOutcome};
use beacon_core::DeviceClass;
use beacon_core::extract::{DomSnapshot, extract_dom_fragment, extract_fragment};
use beacon_core::input::load_targets;
use beacon_core::insights::{
    AccessibilityIssue, Opportunity, SeoDetail, mine_accessibility_issues, mine_opportunities,
    mine_seo_details,
};
use beacon_core::lighthouse::LighthousePayload;
use beacon_core::record::{DeviceFragment, TargetRecord};
use beacon_core::store;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ANALYSIS_ENDPOINT: &str = "https://pagespeed.web.dev/analysis";
const MOBILE_GLOBAL: &str = "__LIGHTHOUSE_MOBILE_JSON__";
const DESKTOP_GLOBAL: &str = "__LIGHTHOUSE_DESKTOP_JSON__";

/// Fallback for page builds that render the report without injecting the
/// result JSON: flatten the visible gauge and metric nodes into the
/// snapshot shape the DOM extractor understands.
const DOM_HARVEST: &str = r#"(() => {
  const text = (node, selector) =>
    ((node.querySelector(selector) || {}).textContent || '').trim();
  const gauges = Array.from(document.querySelectorAll('.lh-gauge__wrapper')).map(n => ({
    label: text(n, '.lh-gauge__label'),
    score: text(n, '.lh-gauge__percentage'),
  }));
  const metrics = Array.from(document.querySelectorAll('.lh-metric')).map(n => ({
    title: text(n, '.lh-metric__title'),
    value: text(n, '.lh-metric__value'),
  }));
  return (gauges.length || metrics.length) ? { gauges, metrics } : null;
})()"#;

/// Session-scoped configuration, built once at batch start and threaded
/// through explicitly.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub urls_file: PathBuf,
    pub output_dir: PathBuf,
    pub chrome_path: Option<PathBuf>,
    pub headless: bool,
    pub screenshots: bool,
    /// Delete the stores before the batch instead of appending to them.
    pub fresh: bool,
    /// Randomized inter-target delay window, in seconds. A rate-limiting
    /// courtesy to the upstream service, not a performance knob.
    pub min_delay_secs: u64,
    pub max_delay_secs: u64,
    pub poll_interval: Duration,
    /// Budget for the first device's data to appear.
    pub max_wait: Duration,
    /// Extra budget for the second device once the first arrived.
    pub settle_wait: Duration,
}

impl RunConfig {
    pub fn new(urls_file: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            urls_file,
            output_dir,
            chrome_path: None,
            headless: true,
            screenshots: false,
            fresh: false,
            min_delay_secs: 5,
            max_delay_secs: 10,
            poll_interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(180),
            settle_wait: Duration::from_secs(60),
        }
    }

    pub fn chrome_path(mut self, path: Option<PathBuf>) -> Self {
        self.chrome_path = path;
        self
    }

    pub fn screenshots(mut self, enabled: bool) -> Self {
        self.screenshots = enabled;
        self
    }

    pub fn fresh(mut self, fresh: bool) -> Self {
        self.fresh = fresh;
        self
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn delay_window(mut self, min_secs: u64, max_secs: u64) -> Self {
        self.min_delay_secs = min_secs.min(max_secs);
        self.max_delay_secs = min_secs.max(max_secs);
        self
    }

    pub fn wait_budget(mut self, max_wait_secs: u64, settle_wait_secs: u64) -> Self {
        self.max_wait = Duration::from_secs(max_wait_secs);
        self.settle_wait = Duration::from_secs(settle_wait_secs);
        self
    }

    pub fn results_path(&self) -> PathBuf {
        self.output_dir.join(store::RESULTS_FILE)
    }

    pub fn opportunities_path(&self) -> PathBuf {
        self.output_dir.join(store::OPPORTUNITIES_FILE)
    }

    pub fn accessibility_path(&self) -> PathBuf {
        self.output_dir.join(store::ACCESSIBILITY_FILE)
    }

    pub fn seo_path(&self) -> PathBuf {
        self.output_dir.join(store::SEO_FILE)
    }
}

/// Everything extracted for one device class in one pass.
pub struct DeviceHarvest {
    pub fragment: DeviceFragment,
    pub opportunities: Vec<Opportunity>,
    pub accessibility: Vec<AccessibilityIssue>,
    pub seo: Vec<SeoDetail>,
}

/// Parse one device's injected payload and run extraction plus all three
/// miners over it. Pure with respect to the payload value.
pub fn harvest_device(
    value: serde_json::Value,
    device: DeviceClass,
    url: &str,
) -> beacon_core::Result<DeviceHarvest> {
    let payload = LighthousePayload::from_value(value)?;
    Ok(DeviceHarvest {
        fragment: extract_fragment(&payload, device),
        opportunities: mine_opportunities(&payload, device, url),
        accessibility: mine_accessibility_issues(&payload, device, url),
        seo: mine_seo_details(&payload, device, url),
    })
}

/// Everything one target pass produced, across both device classes.
pub struct TargetOutcome {
    pub record: Option<TargetRecord>,
    pub opportunities: Vec<Opportunity>,
    pub accessibility: Vec<AccessibilityIssue>,
    pub seo: Vec<SeoDetail>,
}

fn analysis_url(target: &str) -> Result<String> {
    let url = url::Url::parse_with_params(ANALYSIS_ENDPOINT, [("url", target)])
        .context("building analysis URL")?;
    Ok(url.into())
}

/// Redirect-resolved page URL with the query stripped; falls back to the
/// target itself when the browser reports nothing.
fn resolved_url(current: &str, target: &str) -> String {
    let base = current.split('?').next().unwrap_or(current);
    if base.is_empty() {
        target.to_string()
    } else {
        base.to_string()
    }
}

fn screenshot_slug(url: &str) -> String {
    let mut slug: String = url
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    slug.truncate(80);
    slug
}

async fn drive_session(
    session: &BrowserSession,
    config: &RunConfig,
    target: &str,
    screenshot_dir: Option<&Path>,
) -> Result<TargetOutcome> {
    session.navigate(&analysis_url(target)?).await?;

    // The analysis page offers no completion signal; poll for either
    // device's result object, then give the slower device a bounded grace
    // period. Whatever arrived by then is the result.
    let either = format!("window.{MOBILE_GLOBAL} || window.{DESKTOP_GLOBAL} || null");
    if session
        .poll_non_null(&either, config.poll_interval, config.max_wait)
        .await?
        == PollOutcome::TimedOut
    {
        // Older page builds render the report but never inject the JSON;
        // scrape the visible markup before giving up. The rendered report
        // shows the mobile tab.
        tracing::warn!(%target, "no injected result JSON, trying the rendered report");
        let snapshot = session.evaluate(DOM_HARVEST).await?;
        if snapshot.is_null() {
            bail!("analysis data never arrived within {:?}", config.max_wait);
        }
        let snapshot: DomSnapshot =
            serde_json::from_value(snapshot).context("unexpected rendered-report shape")?;
        let fragment = extract_dom_fragment(&snapshot, DeviceClass::Mobile);
        let final_url = resolved_url(&session.current_url().await?, target);
        return Ok(TargetOutcome {
            record: TargetRecord::from_fragments(target, final_url, &[fragment]),
            opportunities: Vec::new(),
            accessibility: Vec::new(),
            seo: Vec::new(),
        });
    }

    let both = format!("(window.{MOBILE_GLOBAL} && window.{DESKTOP_GLOBAL}) ? true : null");
    let _ = session
        .poll_non_null(&both, config.poll_interval, config.settle_wait)
        .await?;

    let final_url = resolved_url(&session.current_url().await?, target);

    let mut fragments = Vec::new();
    let mut outcome = TargetOutcome {
        record: None,
        opportunities: Vec::new(),
        accessibility: Vec::new(),
        seo: Vec::new(),
    };

    for (device, global) in [
        (DeviceClass::Mobile, MOBILE_GLOBAL),
        (DeviceClass::Desktop, DESKTOP_GLOBAL),
    ] {
        let value = session.evaluate(&format!("window.{global} || null")).await?;
        if value.is_null() {
            tracing::warn!(%device, %target, "device data not available, omitting");
            continue;
        }
        match harvest_device(value, device, target) {
            Ok(harvest) => {
                tracing::info!(
                    %device,
                    scores = harvest.fragment.scores.len(),
                    opportunities = harvest.opportunities.len(),
                    accessibility = harvest.accessibility.len(),
                    seo = harvest.seo.len(),
                    "extracted device data"
                );
                fragments.push(harvest.fragment);
                outcome.opportunities.extend(harvest.opportunities);
                outcome.accessibility.extend(harvest.accessibility);
                outcome.seo.extend(harvest.seo);
            }
            Err(e) => {
                tracing::warn!(%device, %target, "payload did not parse, omitting: {}", e);
                continue;
            }
        }

        if let Some(dir) = screenshot_dir {
            let (width, height, mobile) = match device {
                DeviceClass::Mobile => (412, 915, true),
                DeviceClass::Desktop => (1920, 1080, false),
            };
            let path = dir.join(format!("fullhd_{}_{}.png", device, screenshot_slug(target)));
            if let Err(e) = session.capture_full_page(&path, width, height, mobile).await {
                tracing::warn!(%device, "screenshot failed (continuing): {}", e);
            }
        }
    }

    outcome.record = TargetRecord::from_fragments(target, final_url, &fragments);
    Ok(outcome)
}

async fn process_target(
    config: &RunConfig,
    target: &str,
    screenshot_dir: Option<&Path>,
) -> Result<TargetOutcome> {
    let options = LaunchOptions {
        chrome_path: config.chrome_path.clone(),
        headless: config.headless,
        user_agent: None,
    };
    let session = BrowserSession::launch(&options).await?;

    // Always close the browser, whatever the outcome.
    let outcome = drive_session(&session, config, target, screenshot_dir).await;
    if let Err(e) = session.close().await {
        tracing::debug!("browser close failed (ignored): {}", e);
    }
    outcome
}

/// Append everything one target produced. Insight batches are written
/// even when no record was merged: a payload can fail every catalog audit
/// while carrying no category scores or metric values, and those findings
/// must not be lost. Returns whether a primary-store row was written.
pub fn persist_outcome(config: &RunConfig, outcome: &TargetOutcome) -> Result<bool> {
    store::append_opportunities(&config.opportunities_path(), &outcome.opportunities)?;
    store::append_accessibility_issues(&config.accessibility_path(), &outcome.accessibility)?;
    store::append_seo_details(&config.seo_path(), &outcome.seo)?;

    match &outcome.record {
        Some(record) => {
            store::append_target_record(&config.results_path(), record)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Delete the four stores so the batch starts from a clean slate.
fn remove_stale_stores(config: &RunConfig) -> Result<()> {
    for path in [
        config.results_path(),
        config.opportunities_path(),
        config.accessibility_path(),
        config.seo_path(),
    ] {
        match std::fs::remove_file(&path) {
            Ok(()) => tracing::info!(store = %path.display(), "removed stale store"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("removing stale store {}", path.display()));
            }
        }
    }
    Ok(())
}

pub async fn execute(config: RunConfig) -> Result<()> {
    let targets = load_targets(&config.urls_file)?;

    for invalid in &targets.invalid {
        println!(
            "{} line {}: '{}' (invalid URL format)",
            style("skipped").yellow(),
            invalid.line_number,
            invalid.content
        );
    }
    if targets.urls.is_empty() {
        bail!("no valid URLs found in {}", config.urls_file.display());
    }
    println!(
        "Loaded {} URL(s) from {}",
        targets.urls.len(),
        config.urls_file.display()
    );

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating output directory {}", config.output_dir.display()))?;

    if config.fresh {
        remove_stale_stores(&config)?;
    }

    let screenshot_dir = if config.screenshots {
        let dir = config.output_dir.join(format!(
            "screenshots-{}",
            chrono::Local::now().format("%Y%m%d-%H%M%S")
        ));
        std::fs::create_dir_all(&dir)?;
        Some(dir)
    } else {
        None
    };

    let progress = ProgressBar::new(targets.urls.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("[{pos}/{len}] {bar:30.cyan/blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let total = targets.urls.len();
    let mut succeeded = 0usize;
    let mut failed = 0usize;

    for (index, target) in targets.urls.iter().enumerate() {
        progress.set_message(target.clone());

        match process_target(&config, target, screenshot_dir.as_deref()).await {
            Ok(outcome) => {
                // A storage failure is fatal: silent data loss is worse
                // than a visible crash.
                if persist_outcome(&config, &outcome)? {
                    succeeded += 1;
                    progress.println(format!("{} {}", style("ok").green().bold(), target));
                } else {
                    failed += 1;
                    progress.println(format!(
                        "{} {} (no scores or metrics extracted)",
                        style("failed").red().bold(),
                        target
                    ));
                }
            }
            Err(e) => {
                // One target's failure never aborts the batch.
                failed += 1;
                tracing::error!(%target, "target failed: {:#}", e);
                progress.println(format!("{} {}: {:#}", style("failed").red().bold(), target, e));
            }
        }

        progress.inc(1);

        if index + 1 < total {
            let delay = rand::thread_rng()
                .gen_range(config.min_delay_secs..=config.max_delay_secs.max(config.min_delay_secs));
            progress.set_message(format!("waiting {delay}s before next target"));
            tokio::time::sleep(Duration::from_secs(delay)).await;
        }
    }

    progress.finish_and_clear();

    println!();
    println!(
        "{} {} succeeded, {} failed",
        style("Run complete:").bold(),
        succeeded,
        failed
    );
    println!("Artifacts:");
    println!("  {}", config.results_path().display());
    println!("  {}", config.opportunities_path().display());
    println!("  {}", config.accessibility_path().display());
    println!("  {}", config.seo_path().display());
    if let Some(dir) = screenshot_dir {
        println!("  {}", dir.display());
    }

    Ok(())
}
