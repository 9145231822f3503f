//! Reporting over the persisted stores.
//!
//! The stores are append-only, so a re-run can leave multiple rows for one
//! identity URL. Every reporting surface first deduplicates keep-first;
//! the writer never does.

pub mod html;

use crate::normalize::{MetricKind, parse_display};
use crate::record::{CATEGORY_COLUMNS, DeviceClass};
use crate::store::{self, read_rows};
use crate::Result;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

pub type Row = BTreeMap<String, String>;

#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub rows: Vec<Row>,
    /// Rows dropped by keep-first dedup on the identity URL.
    pub duplicates_dropped: usize,
}

/// Load the primary store and deduplicate by identity URL, keeping the
/// first row written for each.
pub fn load_dashboard(path: &Path) -> Result<Dashboard> {
    let all = read_rows(path)?;
    let total = all.len();

    let mut seen = HashSet::new();
    let rows: Vec<Row> = all
        .into_iter()
        .filter(|row| {
            let url = row.get("url").cloned().unwrap_or_default();
            seen.insert(url)
        })
        .collect();

    let duplicates_dropped = total - rows.len();
    if duplicates_dropped > 0 {
        tracing::warn!(duplicates_dropped, "dropped duplicate identity URLs from report");
    }

    Ok(Dashboard {
        rows,
        duplicates_dropped,
    })
}

/// Insight rows read back from the three secondary stores, keyed the way
/// their headers key them. Absent store files read as empty, not errors;
/// a run without failing audits creates no file at all.
#[derive(Debug, Clone, Default)]
pub struct Insights {
    pub opportunities: Vec<Row>,
    pub accessibility: Vec<Row>,
    pub seo: Vec<Row>,
}

impl Insights {
    pub fn is_empty(&self) -> bool {
        self.opportunities.is_empty() && self.accessibility.is_empty() && self.seo.is_empty()
    }
}

/// Load the insight stores that live alongside the primary store.
pub fn load_insights(dir: &Path) -> Result<Insights> {
    Ok(Insights {
        opportunities: read_optional(&dir.join(store::OPPORTUNITIES_FILE))?,
        accessibility: read_optional(&dir.join(store::ACCESSIBILITY_FILE))?,
        seo: read_optional(&dir.join(store::SEO_FILE))?,
    })
}

fn read_optional(path: &Path) -> Result<Vec<Row>> {
    if path.exists() {
        read_rows(path)
    } else {
        Ok(Vec::new())
    }
}

/// A category score cell, parsed back from the store.
pub fn score_of(row: &Row, device: DeviceClass, category: &str) -> Option<i64> {
    row.get(&format!("{}_{}", device.as_str(), category))
        .and_then(|v| v.trim().parse().ok())
}

/// A metric cell re-parsed to its canonical value through the normalizer.
pub fn metric_of(row: &Row, device: DeviceClass, kind: MetricKind) -> Option<f64> {
    row.get(&format!("{}_{}", device.as_str(), kind.column_key()))
        .and_then(|v| parse_display(kind, v))
}

pub fn metric_display<'a>(row: &'a Row, device: DeviceClass, kind: MetricKind) -> Option<&'a str> {
    row.get(&format!("{}_{}", device.as_str(), kind.column_key()))
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
}

/// Mean category score across all rows where the cell is present.
pub fn average_score(rows: &[Row], device: DeviceClass, category: &str) -> Option<f64> {
    let values: Vec<i64> = rows
        .iter()
        .filter_map(|row| score_of(row, device, category))
        .collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<i64>() as f64 / values.len() as f64)
}

/// Mean canonical metric value across all rows where the cell parses.
pub fn average_metric(rows: &[Row], device: DeviceClass, kind: MetricKind) -> Option<f64> {
    let values: Vec<f64> = rows
        .iter()
        .filter_map(|row| metric_of(row, device, kind))
        .collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sub-90 category scores for one row, as (label, score) pairs. This is
/// the "issues" section of the console report.
pub fn weak_scores(row: &Row) -> Vec<(String, i64)> {
    let mut weak = Vec::new();
    for device in DeviceClass::ALL {
        for category in CATEGORY_COLUMNS {
            if let Some(score) = score_of(row, device, category) {
                if score < 90 {
                    weak.push((format!("{} {}", device.as_str(), category.replace('_', " ")), score));
                }
            }
        }
    }
    weak
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{DeviceFragment, TargetRecord};
    use crate::store::append_target_record;

    fn write_record(path: &Path, url: &str, performance: i64) {
        let mut fragment = DeviceFragment::new(DeviceClass::Mobile);
        fragment.scores.insert("performance".to_string(), performance);
        let record = TargetRecord::from_fragments(url, url, &[fragment]).unwrap();
        append_target_record(path, &record).unwrap();
    }

    #[test]
    fn test_dedup_keeps_first_row_per_identity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");

        write_record(&path, "https://a.example", 85);
        write_record(&path, "https://a.example", 40);
        write_record(&path, "https://b.example", 95);

        let dashboard = load_dashboard(&path).unwrap();
        assert_eq!(dashboard.rows.len(), 2);
        assert_eq!(dashboard.duplicates_dropped, 1);
        // Keep-first: the 85 written in the earlier run wins.
        assert_eq!(
            score_of(&dashboard.rows[0], DeviceClass::Mobile, "performance"),
            Some(85)
        );
    }

    #[test]
    fn test_averages_ignore_absent_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");

        write_record(&path, "https://a.example", 80);
        write_record(&path, "https://b.example", 90);

        let dashboard = load_dashboard(&path).unwrap();
        assert_eq!(
            average_score(&dashboard.rows, DeviceClass::Mobile, "performance"),
            Some(85.0)
        );
        assert_eq!(
            average_score(&dashboard.rows, DeviceClass::Desktop, "performance"),
            None
        );
    }

    #[test]
    fn test_load_insights_tolerates_absent_stores() {
        let dir = tempfile::tempdir().unwrap();

        // Only the opportunity store exists; a clean run never creates
        // files for insight kinds that found nothing.
        let opportunity = crate::insights::Opportunity {
            url: "https://a.example".to_string(),
            device: DeviceClass::Mobile,
            audit_id: "render-blocking-resources".to_string(),
            title: "Eliminate render-blocking resources".to_string(),
            description: "Resources are blocking the first paint.".to_string(),
            score: 0.5,
            savings_ms: 1200.0,
            impact: crate::insights::ImpactTier::High,
        };
        crate::store::append_opportunities(
            &dir.path().join(store::OPPORTUNITIES_FILE),
            &[opportunity],
        )
        .unwrap();

        let insights = load_insights(dir.path()).unwrap();
        assert_eq!(insights.opportunities.len(), 1);
        assert_eq!(insights.opportunities[0]["impact"], "High");
        assert!(insights.accessibility.is_empty());
        assert!(insights.seo.is_empty());
        assert!(!insights.is_empty());

        let empty = load_insights(tempfile::tempdir().unwrap().path()).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_weak_scores_lists_sub_90() {
        let mut row = Row::new();
        row.insert("mobile_performance".to_string(), "85".to_string());
        row.insert("mobile_seo".to_string(), "95".to_string());
        row.insert("desktop_best_practices".to_string(), "49".to_string());

        let weak = weak_scores(&row);
        assert_eq!(
            weak,
            vec![
                ("mobile performance".to_string(), 85),
                ("desktop best practices".to_string(), 49),
            ]
        );
    }
}
