use anyhow::{Context, Result, bail};
use beacon_core::report::{html, load_dashboard, load_insights};
use console::style;
use std::path::Path;

pub fn execute(file: &Path, output: &Path) -> Result<()> {
    let dashboard = load_dashboard(file)
        .with_context(|| format!("reading results store {}", file.display()))?;

    if dashboard.rows.is_empty() {
        bail!("{} contains no analyzed URLs", file.display());
    }

    // The insight stores live next to the primary store.
    let store_dir = file.parent().unwrap_or_else(|| Path::new("."));
    let insights = load_insights(store_dir)
        .with_context(|| format!("reading insight stores in {}", store_dir.display()))?;
    if !insights.is_empty() {
        println!(
            "Including {} opportunities, {} accessibility issues, {} SEO details",
            insights.opportunities.len(),
            insights.accessibility.len(),
            insights.seo.len()
        );
    }

    let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let page = html::render(&dashboard, &insights, &generated_at);

    std::fs::write(output, page)
        .with_context(|| format!("writing dashboard to {}", output.display()))?;

    println!(
        "{} dashboard for {} site(s) written to {}",
        style("✅").green(),
        dashboard.rows.len(),
        style(output.display()).cyan()
    );
    if dashboard.duplicates_dropped > 0 {
        println!(
            "{} {} duplicate row(s) ignored (first occurrence kept)",
            style("⚠️ ").yellow(),
            dashboard.duplicates_dropped
        );
    }

    Ok(())
}
