//! Payload extraction: one Lighthouse payload in, one device fragment out.

mod dom;

pub use dom::{DomSnapshot, GaugeNode, MetricNode, extract_dom_fragment};

use crate::lighthouse::LighthousePayload;
use crate::normalize::{MetricKind, MetricValue};
use crate::record::{DeviceClass, DeviceFragment};

/// Extract category scores and the fixed timing-metric catalog from one
/// device class's payload. Pure: the same payload always yields the same
/// fragment. Audits that are absent, or present with neither a display nor
/// a numeric value, are skipped silently.
pub fn extract_fragment(payload: &LighthousePayload, device: DeviceClass) -> DeviceFragment {
    let mut fragment = DeviceFragment::new(device);

    for (key, category) in &payload.categories {
        let Some(score) = category.score else {
            continue;
        };
        fragment
            .scores
            .insert(category_column(&category.title, key), (score * 100.0).round() as i64);
    }

    for kind in MetricKind::ALL {
        let Some(audit) = payload.audits.get(kind.audit_key()) else {
            continue;
        };
        if let Some(value) =
            MetricValue::from_raw(kind, audit.display_value.as_deref(), audit.numeric_value)
        {
            fragment.metrics.insert(kind, value);
        }
    }

    tracing::debug!(
        device = %device,
        scores = fragment.scores.len(),
        metrics = fragment.metrics.len(),
        "extracted device fragment"
    );

    fragment
}

/// Column key for a category: normalized title ("Best Practices" →
/// "best_practices"), falling back to the payload's category key.
fn category_column(title: &str, key: &str) -> String {
    let source = if title.trim().is_empty() { key } else { title };
    source.trim().to_lowercase().replace([' ', '-'], "_")
}
