//! Legacy DOM-snapshot extractor.
//!
//! Older builds of the analysis page did not inject result JSON; scores
//! and metrics had to be read from the rendered report markup
//! (`.lh-gauge__wrapper` and `.lh-metric` nodes). The batch driver's
//! harvest script reduces that markup to this snapshot shape, and the
//! adapter below produces the same fragment keys as the payload extractor.

use crate::normalize::{MetricKind, MetricValue, parse_display};
use crate::record::{DeviceClass, DeviceFragment};
use serde::Deserialize;

/// One category gauge as rendered: its label text and the score text
/// inside the gauge.
#[derive(Debug, Clone, Deserialize)]
pub struct GaugeNode {
    pub label: String,
    pub score: String,
}

/// One timing metric as rendered: the `.lh-metric__title` text and the
/// `.lh-metric__value` text.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricNode {
    pub title: String,
    pub value: String,
}

/// Flattened report markup for one device tab.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomSnapshot {
    #[serde(default)]
    pub gauges: Vec<GaugeNode>,
    #[serde(default)]
    pub metrics: Vec<MetricNode>,
}

/// Extract a device fragment from rendered markup. Same contract as
/// [`super::extract_fragment`]: unparseable nodes are skipped, never
/// errors.
pub fn extract_dom_fragment(snapshot: &DomSnapshot, device: DeviceClass) -> DeviceFragment {
    let mut fragment = DeviceFragment::new(device);

    for gauge in &snapshot.gauges {
        let label = gauge.label.trim();
        if label.is_empty() {
            continue;
        }
        let Ok(score) = gauge.score.trim().parse::<i64>() else {
            tracing::debug!(label, score = %gauge.score, "skipping unparseable gauge score");
            continue;
        };
        let key = label.to_lowercase().replace([' ', '-'], "_");
        fragment.scores.insert(key, score);
    }

    for metric in &snapshot.metrics {
        let Some(kind) = MetricKind::from_title(&metric.title) else {
            continue;
        };
        let display = metric.value.trim();
        if display.is_empty() {
            continue;
        }
        fragment.metrics.insert(
            kind,
            MetricValue {
                display: display.to_string(),
                value: parse_display(kind, display),
            },
        );
    }

    fragment
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> DomSnapshot {
        DomSnapshot {
            gauges: vec![
                GaugeNode {
                    label: "Performance".to_string(),
                    score: "85".to_string(),
                },
                GaugeNode {
                    label: "Best Practices".to_string(),
                    score: "100".to_string(),
                },
                GaugeNode {
                    label: "SEO".to_string(),
                    score: "—".to_string(),
                },
            ],
            metrics: vec![
                MetricNode {
                    title: "First Contentful Paint".to_string(),
                    value: "1.9 s".to_string(),
                },
                MetricNode {
                    title: "Total Blocking Time".to_string(),
                    value: "250 ms".to_string(),
                },
                MetricNode {
                    title: "Server Response Time".to_string(),
                    value: "600 ms".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_dom_fragment_matches_payload_extractor_keys() {
        let fragment = extract_dom_fragment(&sample_snapshot(), DeviceClass::Mobile);

        assert_eq!(fragment.scores["performance"], 85);
        assert_eq!(fragment.scores["best_practices"], 100);
        // Unparseable gauge text is skipped, not an error.
        assert!(!fragment.scores.contains_key("seo"));

        let fcp = &fragment.metrics[&MetricKind::FirstContentfulPaint];
        assert_eq!(fcp.display, "1.9 s");
        assert_eq!(fcp.value, Some(1.9));
        assert_eq!(
            fragment.metrics[&MetricKind::TotalBlockingTime].value,
            Some(250.0)
        );
    }

    #[test]
    fn test_nodes_outside_the_catalog_are_ignored() {
        let fragment = extract_dom_fragment(&sample_snapshot(), DeviceClass::Desktop);
        // "Server Response Time" is not a catalog metric.
        assert_eq!(fragment.metrics.len(), 2);
    }

    #[test]
    fn test_empty_snapshot_yields_empty_fragment() {
        let fragment = extract_dom_fragment(&DomSnapshot::default(), DeviceClass::Mobile);
        assert!(fragment.is_empty());
    }
}
