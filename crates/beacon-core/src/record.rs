//! Target records and the per-device fragments they merge from.

use crate::normalize::{MetricKind, MetricValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Analysis profile a payload was produced under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeviceClass {
    Mobile,
    Desktop,
}

impl DeviceClass {
    pub const ALL: [DeviceClass; 2] = [DeviceClass::Mobile, DeviceClass::Desktop];

    /// Column prefix and the value written to the device_type column of the
    /// insight stores.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Mobile => "mobile",
            DeviceClass::Desktop => "desktop",
        }
    }
}

impl std::fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four category columns, in store order. Categories outside this list
/// still land in the record, as stable extra columns.
pub const CATEGORY_COLUMNS: [&str; 4] = ["performance", "accessibility", "best_practices", "seo"];

/// Everything extracted from one device class's payload: 0-100 category
/// scores keyed by normalized category title, and normalized timing
/// metrics. Pure data; producing one has no side effects.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceFragment {
    pub device: DeviceClass,
    pub scores: BTreeMap<String, i64>,
    pub metrics: BTreeMap<MetricKind, MetricValue>,
}

impl DeviceFragment {
    pub fn new(device: DeviceClass) -> Self {
        Self {
            device,
            scores: BTreeMap::new(),
            metrics: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty() && self.metrics.is_empty()
    }
}

/// The accumulated row for one target, keyed by its original input URL.
/// Columns are device-prefixed, so merging fragments is a plain union.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetRecord {
    pub url: String,
    pub final_url: String,
    columns: BTreeMap<String, String>,
}

impl TargetRecord {
    /// Merge fragments for one processing pass into a record. Returns None
    /// when no device class produced data; such a pass emits no row.
    pub fn from_fragments(
        url: impl Into<String>,
        final_url: impl Into<String>,
        fragments: &[DeviceFragment],
    ) -> Option<Self> {
        if fragments.iter().all(|f| f.is_empty()) {
            return None;
        }
        let mut record = TargetRecord {
            url: url.into(),
            final_url: final_url.into(),
            columns: BTreeMap::new(),
        };
        for fragment in fragments {
            record.merge(fragment);
        }
        Some(record)
    }

    /// Key-wise union. Fragment keys are device-prefixed and therefore
    /// disjoint across devices; there is nothing to resolve.
    pub fn merge(&mut self, fragment: &DeviceFragment) {
        let prefix = fragment.device.as_str();
        for (category, score) in &fragment.scores {
            self.columns
                .insert(format!("{prefix}_{category}"), score.to_string());
        }
        for (kind, value) in &fragment.metrics {
            self.columns
                .insert(format!("{prefix}_{}", kind.column_key()), value.display.clone());
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        match column {
            "url" => Some(&self.url),
            "final_url" => Some(&self.final_url),
            _ => self.columns.get(column).map(String::as_str),
        }
    }

    /// Columns this record carries beyond the fixed list, in stable
    /// (sorted) order.
    pub fn extra_columns(&self) -> Vec<String> {
        let fixed = fixed_columns();
        self.columns
            .keys()
            .filter(|k| !fixed.iter().any(|f| f == *k))
            .cloned()
            .collect()
    }
}

/// The fixed superset column order of the primary store: identity and
/// resolved URL, category scores per device, then timing metrics per
/// device.
pub fn fixed_columns() -> Vec<String> {
    let mut columns = vec!["url".to_string(), "final_url".to_string()];
    for device in DeviceClass::ALL {
        for category in CATEGORY_COLUMNS {
            columns.push(format!("{}_{}", device.as_str(), category));
        }
    }
    for device in DeviceClass::ALL {
        for kind in MetricKind::ALL {
            columns.push(format!("{}_{}", device.as_str(), kind.column_key()));
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_fragment(device: DeviceClass) -> DeviceFragment {
        let mut fragment = DeviceFragment::new(device);
        fragment.scores.insert("performance".to_string(), 85);
        fragment.metrics.insert(
            MetricKind::FirstContentfulPaint,
            MetricValue {
                display: "1.2 s".to_string(),
                value: Some(1.2),
            },
        );
        fragment
    }

    #[test]
    fn test_fixed_columns_layout() {
        let columns = fixed_columns();
        assert_eq!(columns.len(), 2 + 8 + 14);
        assert_eq!(columns[0], "url");
        assert_eq!(columns[1], "final_url");
        assert_eq!(columns[2], "mobile_performance");
        assert_eq!(columns[6], "desktop_performance");
        assert_eq!(columns[10], "mobile_first_contentful_paint");
        assert_eq!(columns[17], "desktop_first_contentful_paint");
        assert_eq!(columns[23], "desktop_first_meaningful_paint");
    }

    #[test]
    fn test_merge_is_commutative() {
        let mobile = sample_fragment(DeviceClass::Mobile);
        let mut desktop = sample_fragment(DeviceClass::Desktop);
        desktop.scores.insert("seo".to_string(), 92);

        let a = TargetRecord::from_fragments(
            "https://example.com",
            "https://example.com/",
            &[mobile.clone(), desktop.clone()],
        )
        .unwrap();
        let b = TargetRecord::from_fragments(
            "https://example.com",
            "https://example.com/",
            &[desktop, mobile],
        )
        .unwrap();

        assert_eq!(a, b);
        assert_eq!(a.get("mobile_performance"), Some("85"));
        assert_eq!(a.get("desktop_seo"), Some("92"));
        assert_eq!(a.get("desktop_first_contentful_paint"), Some("1.2 s"));
    }

    #[test]
    fn test_no_record_from_zero_fragments() {
        assert_eq!(
            TargetRecord::from_fragments("https://example.com", "https://example.com", &[]),
            None
        );
        // Fragments that extracted nothing count as zero fragments too.
        assert_eq!(
            TargetRecord::from_fragments(
                "https://example.com",
                "https://example.com",
                &[DeviceFragment::new(DeviceClass::Mobile)]
            ),
            None
        );
    }

    #[test]
    fn test_single_device_record_omits_the_other() {
        let record = TargetRecord::from_fragments(
            "https://example.com",
            "https://example.com",
            &[sample_fragment(DeviceClass::Mobile)],
        )
        .unwrap();

        assert_eq!(record.get("mobile_performance"), Some("85"));
        assert_eq!(record.get("desktop_performance"), None);
    }

    #[test]
    fn test_extra_columns_are_stable_and_sorted() {
        let mut fragment = sample_fragment(DeviceClass::Mobile);
        fragment.scores.insert("pwa".to_string(), 30);
        fragment.scores.insert("custom".to_string(), 10);

        let record =
            TargetRecord::from_fragments("https://example.com", "https://example.com", &[fragment])
                .unwrap();
        assert_eq!(record.extra_columns(), vec!["mobile_custom", "mobile_pwa"]);
    }
}
