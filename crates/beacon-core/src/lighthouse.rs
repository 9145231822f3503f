use serde::Deserialize;
use std::collections::BTreeMap;

/// One Lighthouse result object as injected into the analysis page
/// (`window.__LIGHTHOUSE_MOBILE_JSON__` / `__LIGHTHOUSE_DESKTOP_JSON__`).
///
/// The payload is owned by the external service and carries far more than
/// we read; unknown fields are ignored on purpose.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LighthousePayload {
    #[serde(default)]
    pub categories: BTreeMap<String, Category>,
    #[serde(default)]
    pub audits: BTreeMap<String, Audit>,
}

/// A top-level category (Performance, Accessibility, Best Practices, SEO).
#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub title: String,
    /// Score on the 0..1 scale, or null when the category did not run.
    pub score: Option<f64>,
}

/// A single named audit within the payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Audit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub score: Option<f64>,
    #[serde(rename = "displayValue")]
    pub display_value: Option<String>,
    #[serde(rename = "numericValue")]
    pub numeric_value: Option<f64>,
    /// Opaque detail blob; only `overallSavingsMs` is read, by the
    /// opportunity miner.
    pub details: Option<serde_json::Value>,
}

impl Audit {
    /// Estimated savings in milliseconds, when the audit carries one.
    pub fn overall_savings_ms(&self) -> Option<f64> {
        self.details
            .as_ref()
            .and_then(|d| d.get("overallSavingsMs"))
            .and_then(|v| v.as_f64())
    }
}

impl LighthousePayload {
    pub fn from_value(value: serde_json::Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_parses_categories_and_audits() {
        let payload = LighthousePayload::from_value(json!({
            "categories": {
                "performance": { "title": "Performance", "score": 0.85 },
                "seo": { "title": "SEO", "score": null }
            },
            "audits": {
                "first-contentful-paint": {
                    "title": "First Contentful Paint",
                    "description": "FCP marks the time at which the first text or image is painted.",
                    "score": 0.9,
                    "displayValue": "1.2 s",
                    "numericValue": 1200.0
                }
            },
            "lighthouseVersion": "11.0.0"
        }))
        .unwrap();

        assert_eq!(payload.categories["performance"].score, Some(0.85));
        assert_eq!(payload.categories["seo"].score, None);
        let fcp = &payload.audits["first-contentful-paint"];
        assert_eq!(fcp.display_value.as_deref(), Some("1.2 s"));
        assert_eq!(fcp.numeric_value, Some(1200.0));
    }

    #[test]
    fn test_overall_savings_ms_read_from_details() {
        let audit: Audit = serde_json::from_value(json!({
            "title": "Optimize images",
            "score": 0.5,
            "details": { "type": "opportunity", "overallSavingsMs": 1200 }
        }))
        .unwrap();

        assert_eq!(audit.overall_savings_ms(), Some(1200.0));

        let no_details = Audit::default();
        assert_eq!(no_details.overall_savings_ms(), None);
    }
}
