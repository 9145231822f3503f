use anyhow::{Context, Result, bail};
use beacon_core::DeviceClass;
use beacon_core::classify::{Rating, classify_score};
use beacon_core::normalize::MetricKind;
use beacon_core::record::CATEGORY_COLUMNS;
use beacon_core::report::{self, Row, load_dashboard};
use console::style;
use std::path::Path;

pub fn execute(file: &Path) -> Result<()> {
    let dashboard = load_dashboard(file)
        .with_context(|| format!("reading results store {}", file.display()))?;

    if dashboard.rows.is_empty() {
        bail!("{} contains no analyzed URLs", file.display());
    }

    println!(
        "\n{}",
        style(format!("PageSpeed Report: {}", file.display()))
            .bold()
            .cyan()
    );
    println!(
        "  Generated:    {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "  Sites:        {}",
        style(dashboard.rows.len()).yellow()
    );
    if dashboard.duplicates_dropped > 0 {
        println!(
            "  {}",
            style(format!(
                "{} duplicate row(s) ignored (first occurrence kept)",
                dashboard.duplicates_dropped
            ))
            .yellow()
        );
    }

    for row in &dashboard.rows {
        print_site(row);
    }

    print_averages(&dashboard.rows);
    print_vitals(&dashboard.rows);

    println!();
    Ok(())
}

fn print_site(row: &Row) {
    let url = row.get("url").map(String::as_str).unwrap_or("(unknown)");
    println!("\n{}", style(url).bold());

    for device in DeviceClass::ALL {
        let line: Vec<String> = CATEGORY_COLUMNS
            .iter()
            .map(|category| {
                let score = report::score_of(row, device, category);
                format!("{} {}", category_label(category), styled_score(score))
            })
            .collect();
        println!("  {:<8} {}", format!("{device}:"), line.join("  "));
    }

    let weak = report::weak_scores(row);
    if !weak.is_empty() {
        let summary: Vec<String> = weak
            .iter()
            .map(|(column, score)| format!("{column}={score}"))
            .collect();
        println!(
            "  {:<8} {}",
            style("issues:").dim(),
            style(summary.join(", ")).yellow()
        );
    }
}

fn print_averages(rows: &[Row]) {
    println!("\n{}", style("Average Scores").bold());
    for device in DeviceClass::ALL {
        let line: Vec<String> = CATEGORY_COLUMNS
            .iter()
            .map(|category| {
                let avg = report::average_score(rows, device, category);
                let display = match avg {
                    Some(v) => styled_score(Some(v.round() as i64)),
                    None => style("-".to_string()).dim().to_string(),
                };
                format!("{} {}", category_label(category), display)
            })
            .collect();
        println!("  {:<8} {}", format!("{device}:"), line.join("  "));
    }
}

fn print_vitals(rows: &[Row]) {
    println!("\n{}", style("Core Web Vitals (averages)").bold());
    let vitals = [
        MetricKind::FirstContentfulPaint,
        MetricKind::LargestContentfulPaint,
        MetricKind::TotalBlockingTime,
        MetricKind::CumulativeLayoutShift,
        MetricKind::SpeedIndex,
    ];
    for device in DeviceClass::ALL {
        let line: Vec<String> = vitals
            .iter()
            .map(|&kind| {
                let display = match report::average_metric(rows, device, kind) {
                    Some(v) => format_metric(kind, v),
                    None => "-".to_string(),
                };
                format!("{} {}", metric_label(kind), display)
            })
            .collect();
        println!("  {:<8} {}", format!("{device}:"), line.join("  "));
    }
}

fn format_metric(kind: MetricKind, value: f64) -> String {
    match kind {
        MetricKind::CumulativeLayoutShift => format!("{value:.3}"),
        MetricKind::TotalBlockingTime => format!("{value:.0} ms"),
        _ => format!("{value:.1} s"),
    }
}

fn metric_label(kind: MetricKind) -> &'static str {
    match kind {
        MetricKind::FirstContentfulPaint => "FCP",
        MetricKind::LargestContentfulPaint => "LCP",
        MetricKind::TotalBlockingTime => "TBT",
        MetricKind::CumulativeLayoutShift => "CLS",
        MetricKind::SpeedIndex => "SI",
        MetricKind::TimeToInteractive => "TTI",
        MetricKind::FirstMeaningfulPaint => "FMP",
    }
}

fn category_label(category: &str) -> &'static str {
    match category {
        "performance" => "perf",
        "accessibility" => "a11y",
        "best_practices" => "best",
        "seo" => "seo",
        _ => "?",
    }
}

fn styled_score(score: Option<i64>) -> String {
    let Some(score) = score else {
        return style("-".to_string()).dim().to_string();
    };
    let text = score.to_string();
    match classify_score(Some(score)) {
        Rating::Good => style(text).green().to_string(),
        Rating::NeedsImprovement => style(text).yellow().to_string(),
        Rating::Poor => style(text).red().to_string(),
        Rating::Unknown => style(text).dim().to_string(),
    }
}
