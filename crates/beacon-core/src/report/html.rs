//! Static HTML dashboard rendering.
//!
//! A pure function of the deduplicated dashboard rows; color coding comes
//! from the shared classifier, never from a second threshold table.

use super::{Dashboard, Insights, Row, average_score, metric_display, metric_of, score_of};
use crate::classify::{Rating, THRESHOLDS, classify_metric, classify_score};
use crate::normalize::MetricKind;
use crate::record::{CATEGORY_COLUMNS, DeviceClass};
use std::collections::BTreeMap;

const STYLE: &str = r#"
    body { font-family: 'Segoe UI', Roboto, -apple-system, sans-serif; margin: 0; padding: 24px;
           background: #f8f9fa; color: #202124; line-height: 1.5; }
    .container { max-width: 1200px; margin: 0 auto; background: #fff; border-radius: 8px;
                 box-shadow: 0 1px 3px rgba(60,64,67,.3); overflow: hidden; }
    .header { background: linear-gradient(135deg, #4285f4, #1a73e8); color: #fff;
              text-align: center; padding: 32px 24px; }
    .header h1 { margin: 0; font-size: 32px; font-weight: 400; }
    .header .subtitle { margin-top: 8px; opacity: .9; font-size: 15px; }
    .summary { display: flex; gap: 16px; margin: 24px; flex-wrap: wrap; }
    .summary-card { flex: 1; border: 1px solid #e8eaed; border-radius: 8px; padding: 20px;
                    text-align: center; min-width: 160px; }
    .summary-card h3 { margin: 0 0 8px; font-size: 13px; color: #5f6368;
                       text-transform: uppercase; letter-spacing: .5px; }
    .summary-card .number { font-size: 36px; font-weight: 300; color: #4285f4; }
    section { margin: 0 24px 32px; }
    h2 { font-size: 20px; font-weight: 500; border-bottom: 1px solid #e8eaed; padding-bottom: 8px; }
    table { border-collapse: collapse; width: 100%; font-size: 14px; }
    th, td { border: 1px solid #e8eaed; padding: 8px 10px; text-align: left; }
    th { background: #f1f3f4; color: #3c4043; font-weight: 500; }
    td.good { background: #0cce6b; color: #fff; }
    td.needs-improvement { background: #ffa400; color: #fff; }
    td.poor { background: #ff5722; color: #fff; }
    td.unknown { color: #5f6368; }
    .legend { background: #f8f9fa; border-radius: 8px; padding: 16px; font-size: 13px;
              color: #5f6368; }
    .legend h4 { margin: 0 0 8px; color: #3c4043; }
    .warning { margin: 0 24px 16px; color: #b06000; font-size: 14px; }
    .insight-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(280px, 1fr));
                    gap: 12px; margin-top: 12px; }
    .insight-card { background: #fff; border: 1px solid #e8eaed; border-left: 4px solid #5f6368;
                    border-radius: 8px; padding: 14px; font-size: 13px; }
    .insight-card h4 { margin: 0 0 6px; font-size: 14px; }
    .insight-card p { margin: 0; color: #5f6368; }
    .insight-card.impact-high, .insight-card.severity-critical { border-left-color: #ff5722; }
    .insight-card.impact-medium { border-left-color: #ffa400; }
    .insight-card.impact-low { border-left-color: #0cce6b; }
    .insight-card.severity-warning { border-left-color: #ffa400; }
    .badge { display: inline-block; padding: 2px 8px; border-radius: 10px; font-size: 12px;
             background: #f1f3f4; color: #3c4043; margin-right: 6px; }
    .badge.savings { background: #0cce6b; color: #fff; }
    .url-group h3 { font-size: 15px; font-weight: 500; margin: 20px 0 4px; }
    td.status-pass { color: #0cce6b; font-weight: 500; }
    td.status-fail { color: #ff5722; font-weight: 500; }
    td.status-warning { color: #b06000; font-weight: 500; }
"#;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn rating_class(rating: Rating) -> &'static str {
    rating.as_str()
}

fn score_cell(row: &Row, device: DeviceClass, category: &str) -> String {
    match score_of(row, device, category) {
        Some(score) => format!(
            r#"<td class="{}">{}</td>"#,
            rating_class(classify_score(Some(score))),
            score
        ),
        None => r#"<td class="unknown">&mdash;</td>"#.to_string(),
    }
}

fn metric_cell(row: &Row, device: DeviceClass, kind: MetricKind) -> String {
    match metric_display(row, device, kind) {
        Some(display) => {
            let rating = classify_metric(kind, metric_of(row, device, kind));
            format!(r#"<td class="{}">{}</td>"#, rating_class(rating), escape(display))
        }
        None => r#"<td class="unknown">&mdash;</td>"#.to_string(),
    }
}

fn category_label(category: &str) -> String {
    let mut label = category.replace('_', " ");
    if let Some(first) = label.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    label
}

fn scores_table(rows: &[Row], device: DeviceClass) -> String {
    let mut out = String::new();
    out.push_str("<table><tr><th>URL</th>");
    for category in CATEGORY_COLUMNS {
        out.push_str(&format!("<th>{}</th>", category_label(category)));
    }
    out.push_str("</tr>\n");
    for row in rows {
        let url = row.get("url").map(String::as_str).unwrap_or("");
        out.push_str(&format!("<tr><td>{}</td>", escape(url)));
        for category in CATEGORY_COLUMNS {
            out.push_str(&score_cell(row, device, category));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>");
    out
}

fn metrics_table(rows: &[Row], device: DeviceClass) -> String {
    let shown = [
        MetricKind::FirstContentfulPaint,
        MetricKind::LargestContentfulPaint,
        MetricKind::TotalBlockingTime,
        MetricKind::CumulativeLayoutShift,
        MetricKind::SpeedIndex,
    ];

    let mut out = String::new();
    out.push_str("<table><tr><th>URL</th><th>FCP</th><th>LCP</th><th>TBT</th><th>CLS</th><th>SI</th></tr>\n");
    for row in rows {
        let url = row.get("url").map(String::as_str).unwrap_or("");
        out.push_str(&format!("<tr><td>{}</td>", escape(url)));
        for kind in shown {
            out.push_str(&metric_cell(row, device, kind));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>");
    out
}

fn summary_cards(dashboard: &Dashboard) -> String {
    let mut cards = vec![format!(
        r#"<div class="summary-card"><h3>URLs analyzed</h3><div class="number">{}</div></div>"#,
        dashboard.rows.len()
    )];
    for device in DeviceClass::ALL {
        if let Some(avg) = average_score(&dashboard.rows, device, "performance") {
            cards.push(format!(
                r#"<div class="summary-card"><h3>Avg {} performance</h3><div class="number">{:.0}</div></div>"#,
                device.as_str(),
                avg
            ));
        }
    }
    format!(r#"<div class="summary">{}</div>"#, cards.join("\n"))
}

fn thresholds_legend() -> String {
    let mut items = String::new();
    for (kind, good, poor) in THRESHOLDS {
        let unit = match kind {
            MetricKind::TotalBlockingTime => " ms",
            MetricKind::CumulativeLayoutShift => "",
            _ => " s",
        };
        items.push_str(&format!(
            "<div>{}: Good &le; {}{unit}, Needs Improvement &le; {}{unit}, Poor &gt; {}{unit}</div>\n",
            category_label(kind.column_key()),
            good,
            poor,
            poor
        ));
    }
    format!(
        r#"<div class="legend"><h4>Core Web Vitals thresholds</h4>{}</div>"#,
        items
    )
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let cut: String = text.chars().take(limit).collect();
        format!("{cut}…")
    }
}

fn group_by_url(rows: &[Row]) -> BTreeMap<&str, Vec<&Row>> {
    let mut groups: BTreeMap<&str, Vec<&Row>> = BTreeMap::new();
    for row in rows {
        let url = row.get("url").map(String::as_str).unwrap_or("");
        groups.entry(url).or_default().push(row);
    }
    groups
}

fn savings_ms(row: &Row) -> f64 {
    row.get("potential_savings_ms")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0.0)
}

/// Opportunity cards per URL, biggest estimated savings first, capped at
/// five per URL.
fn opportunities_section(rows: &[Row]) -> String {
    let mut out = String::from("<section><h2>Optimization opportunities</h2>\n");
    for (url, mut group) in group_by_url(rows) {
        group.sort_by(|a, b| {
            savings_ms(b)
                .partial_cmp(&savings_ms(a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        out.push_str(&format!(
            r#"<div class="url-group"><h3>{}</h3><div class="insight-grid">"#,
            escape(url)
        ));
        for row in group.iter().take(5) {
            let impact = row.get("impact").map(String::as_str).unwrap_or("");
            let device = row.get("device_type").map(String::as_str).unwrap_or("");
            let title = row.get("title").map(String::as_str).unwrap_or("");
            let description = row.get("description").map(String::as_str).unwrap_or("");
            let savings = row.get("potential_savings_s").map(String::as_str).unwrap_or("0");
            out.push_str(&format!(
                r#"<div class="insight-card impact-{}"><span class="badge">{} impact</span><span class="badge savings">save {} s</span><span class="badge">{}</span><h4>{}</h4><p>{}</p></div>"#,
                impact.to_lowercase(),
                escape(impact),
                escape(savings),
                escape(device),
                escape(title),
                escape(&truncate(description, 100)),
            ));
        }
        out.push_str("</div></div>\n");
    }
    out.push_str("</section>\n");
    out
}

/// Accessibility cards per URL, Critical before Warning, capped at six
/// per URL.
fn accessibility_section(rows: &[Row]) -> String {
    let mut out = String::from("<section><h2>Accessibility issues</h2>\n");
    for (url, mut group) in group_by_url(rows) {
        let critical = group
            .iter()
            .filter(|r| r.get("severity").map(String::as_str) == Some("Critical"))
            .count();
        group.sort_by_key(|r| r.get("severity").map(String::as_str) != Some("Critical"));
        out.push_str(&format!(
            r#"<div class="url-group"><h3>{}</h3><div><span class="badge">{} critical</span><span class="badge">{} warnings</span></div><div class="insight-grid">"#,
            escape(url),
            critical,
            group.len() - critical
        ));
        for row in group.iter().take(6) {
            let severity = row.get("severity").map(String::as_str).unwrap_or("");
            let device = row.get("device_type").map(String::as_str).unwrap_or("");
            let title = row.get("title").map(String::as_str).unwrap_or("");
            let description = row.get("description").map(String::as_str).unwrap_or("");
            out.push_str(&format!(
                r#"<div class="insight-card severity-{}"><span class="badge">{}</span><span class="badge">{}</span><h4>{}</h4><p>{}</p></div>"#,
                severity.to_lowercase(),
                escape(severity),
                escape(device),
                escape(title),
                escape(&truncate(description, 120)),
            ));
        }
        out.push_str("</div></div>\n");
    }
    out.push_str("</section>\n");
    out
}

/// SEO audits that did not pass outright, as a flat table.
fn seo_section(rows: &[Row]) -> String {
    let flagged: Vec<&Row> = rows
        .iter()
        .filter(|r| r.get("status").map(String::as_str) != Some("Pass"))
        .collect();
    if flagged.is_empty() {
        return String::new();
    }

    let mut out = String::from(
        "<section><h2>SEO findings</h2><table><tr><th>URL</th><th>Device</th><th>Audit</th><th>Status</th><th>Detail</th></tr>\n",
    );
    for row in flagged {
        let status = row.get("status").map(String::as_str).unwrap_or("");
        out.push_str(&format!(
            r#"<tr><td>{}</td><td>{}</td><td>{}</td><td class="status-{}">{}</td><td>{}</td></tr>"#,
            escape(row.get("url").map(String::as_str).unwrap_or("")),
            escape(row.get("device_type").map(String::as_str).unwrap_or("")),
            escape(row.get("title").map(String::as_str).unwrap_or("")),
            status.to_lowercase(),
            escape(status),
            escape(row.get("displayValue").map(String::as_str).unwrap_or("")),
        ));
        out.push('\n');
    }
    out.push_str("</table></section>\n");
    out
}

/// Render the full dashboard document. Insight sections appear only for
/// stores that had rows to show.
pub fn render(dashboard: &Dashboard, insights: &Insights, generated_at: &str) -> String {
    let mut body = String::new();

    body.push_str(&format!(
        r#"<div class="header"><h1>Lighthouse Analysis Dashboard</h1>
<div class="subtitle">Generated {} &middot; {} URLs</div></div>"#,
        escape(generated_at),
        dashboard.rows.len()
    ));

    if dashboard.duplicates_dropped > 0 {
        body.push_str(&format!(
            r#"<p class="warning">Dropped {} duplicate row(s) for already-reported URLs (keep-first).</p>"#,
            dashboard.duplicates_dropped
        ));
    }

    body.push_str(&summary_cards(dashboard));

    for device in DeviceClass::ALL {
        body.push_str(&format!(
            "<section><h2>{} scores</h2>{}</section>\n",
            category_label(device.as_str()),
            scores_table(&dashboard.rows, device)
        ));
    }
    for device in DeviceClass::ALL {
        body.push_str(&format!(
            "<section><h2>{} Core Web Vitals</h2>{}</section>\n",
            category_label(device.as_str()),
            metrics_table(&dashboard.rows, device)
        ));
    }

    if !insights.opportunities.is_empty() {
        body.push_str(&opportunities_section(&insights.opportunities));
    }
    if !insights.accessibility.is_empty() {
        body.push_str(&accessibility_section(&insights.accessibility));
    }
    body.push_str(&seo_section(&insights.seo));

    body.push_str(&format!("<section>{}</section>", thresholds_legend()));

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Lighthouse Analysis Dashboard</title>\n<style>{STYLE}</style>\n</head>\n\
         <body><div class=\"container\">{body}</div></body>\n</html>\n"
    )
}
