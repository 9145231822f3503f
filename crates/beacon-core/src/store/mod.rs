//! Append-only tabular stores.
//!
//! Every store follows the same discipline: the header row is written
//! exactly once, when the file is first created (or found empty); every
//! later call appends data rows without re-reading prior rows. Rows are
//! never deduplicated here; keep-first dedup by identity URL is a
//! reporting concern.

pub mod csv;

use crate::insights::{AccessibilityIssue, Opportunity, SeoDetail};
use crate::record::{TargetRecord, fixed_columns};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Store filenames, shared by the writer and every reporting surface.
pub const RESULTS_FILE: &str = "pagespeed_results.csv";
pub const OPPORTUNITIES_FILE: &str = "lighthouse_opportunities.csv";
pub const ACCESSIBILITY_FILE: &str = "lighthouse_accessibility.csv";
pub const SEO_FILE: &str = "lighthouse_seo_details.csv";

pub const OPPORTUNITY_HEADER: [&str; 9] = [
    "url",
    "device_type",
    "audit_id",
    "title",
    "description",
    "score",
    "potential_savings_ms",
    "potential_savings_s",
    "impact",
];

pub const ACCESSIBILITY_HEADER: [&str; 8] = [
    "url",
    "device_type",
    "audit_id",
    "title",
    "description",
    "score",
    "severity",
    "impact",
];

pub const SEO_HEADER: [&str; 8] = [
    "url",
    "device_type",
    "audit_id",
    "title",
    "description",
    "score",
    "status",
    "displayValue",
];

fn is_new_store(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true)
}

fn open_append(path: &Path) -> Result<BufWriter<std::fs::File>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(BufWriter::new(file))
}

/// Column order already persisted in an existing store's header row.
fn existing_header(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    let mut rows = csv::parse_rows(&text);
    if rows.is_empty() {
        return Err(Error::InvalidStore(format!(
            "{} has no header row",
            path.display()
        )));
    }
    Ok(rows.remove(0))
}

/// Append one merged target record to the primary store.
///
/// On first write the header is the fixed column order plus any extra
/// columns this record carries. On later writes the row is aligned to the
/// header already on disk: missing columns are left empty, and columns the
/// header does not know are dropped with a warning.
pub fn append_target_record(path: &Path, record: &TargetRecord) -> Result<()> {
    let header = if is_new_store(path) {
        let mut header = fixed_columns();
        header.extend(record.extra_columns());
        header
    } else {
        existing_header(path)?
    };

    for extra in record.extra_columns() {
        if !header.contains(&extra) {
            tracing::warn!(
                column = %extra,
                store = %path.display(),
                "column not in the persisted header; value dropped"
            );
        }
    }

    let row: Vec<String> = header
        .iter()
        .map(|column| record.get(column).unwrap_or_default().to_string())
        .collect();

    let new = is_new_store(path);
    let mut writer = open_append(path)?;
    if new {
        csv::write_row(&mut writer, &header)?;
        tracing::info!(store = %path.display(), "created primary store");
    }
    csv::write_row(&mut writer, &row)?;
    writer.flush()?;

    tracing::debug!(url = %record.url, store = %path.display(), "appended target record");
    Ok(())
}

fn append_rows(path: &Path, header: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    let new = is_new_store(path);
    let mut writer = open_append(path)?;
    if new {
        let header: Vec<String> = header.iter().map(|s| s.to_string()).collect();
        csv::write_row(&mut writer, &header)?;
        tracing::info!(store = %path.display(), "created insight store");
    }
    for row in rows {
        csv::write_row(&mut writer, &row)?;
    }
    writer.flush()?;
    Ok(())
}

fn fmt_score(score: Option<f64>) -> String {
    score.map(|s| format!("{}", s)).unwrap_or_default()
}

pub fn append_opportunities(path: &Path, opportunities: &[Opportunity]) -> Result<()> {
    let rows = opportunities
        .iter()
        .map(|o| {
            vec![
                o.url.clone(),
                o.device.to_string(),
                o.audit_id.clone(),
                o.title.clone(),
                o.description.clone(),
                fmt_score(Some(o.score)),
                format!("{}", o.savings_ms),
                format!("{:.2}", o.savings_ms / 1000.0),
                o.impact.as_str().to_string(),
            ]
        })
        .collect();
    append_rows(path, &OPPORTUNITY_HEADER, rows)
}

pub fn append_accessibility_issues(path: &Path, issues: &[AccessibilityIssue]) -> Result<()> {
    let rows = issues
        .iter()
        .map(|i| {
            vec![
                i.url.clone(),
                i.device.to_string(),
                i.audit_id.clone(),
                i.title.clone(),
                i.description.clone(),
                fmt_score(Some(i.score)),
                i.severity.as_str().to_string(),
                i.impact.clone(),
            ]
        })
        .collect();
    append_rows(path, &ACCESSIBILITY_HEADER, rows)
}

pub fn append_seo_details(path: &Path, details: &[SeoDetail]) -> Result<()> {
    let rows = details
        .iter()
        .map(|d| {
            vec![
                d.url.clone(),
                d.device.to_string(),
                d.audit_id.clone(),
                d.title.clone(),
                d.description.clone(),
                fmt_score(d.score),
                d.status.as_str().to_string(),
                d.display_value.clone(),
            ]
        })
        .collect();
    append_rows(path, &SEO_HEADER, rows)
}

/// Read a store back as header-keyed rows, for reporting.
pub fn read_rows(path: &Path) -> Result<Vec<BTreeMap<String, String>>> {
    let text = std::fs::read_to_string(path)?;
    let mut rows = csv::parse_rows(&text);
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let header = rows.remove(0);
    Ok(rows
        .into_iter()
        .map(|row| {
            header
                .iter()
                .cloned()
                .zip(row.into_iter().chain(std::iter::repeat(String::new())))
                .collect()
        })
        .collect())
}
