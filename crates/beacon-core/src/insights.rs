//! Insight miners: opportunities, accessibility issues, SEO audit details.
//!
//! Each miner walks a closed audit catalog against one device's payload
//! and emits independent records tagged with the identity URL and device
//! class. Mobile and desktop runs are never merged; the stores simply
//! concatenate them.

use crate::lighthouse::LighthousePayload;
use crate::record::DeviceClass;
use serde::Serialize;

/// Performance-opportunity audits worth surfacing, with fallback titles
/// for payloads that omit the audit title.
pub const OPPORTUNITY_AUDITS: [(&str, &str); 12] = [
    ("uses-optimized-images", "Optimize images"),
    ("modern-image-formats", "Use modern image formats"),
    ("unused-css-rules", "Remove unused CSS"),
    ("render-blocking-resources", "Eliminate render-blocking resources"),
    ("uses-text-compression", "Enable text compression"),
    ("efficient-animated-content", "Use efficient animated content"),
    ("uses-responsive-images", "Use appropriately sized images"),
    ("offscreen-images", "Defer offscreen images"),
    ("unminified-css", "Minify CSS"),
    ("unminified-javascript", "Minify JavaScript"),
    ("uses-http2", "Use HTTP/2"),
    ("font-display", "Ensure text remains visible during webfont load"),
];

pub const ACCESSIBILITY_AUDITS: [(&str, &str); 10] = [
    ("color-contrast", "Color contrast"),
    ("image-alt", "Image alt text"),
    ("aria-labels", "ARIA labels"),
    ("heading-order", "Heading order"),
    ("link-name", "Link names"),
    ("button-name", "Button names"),
    ("form-field-multiple-labels", "Form field labels"),
    ("skip-link", "Skip links"),
    ("tabindex", "Tab index usage"),
    ("focus-traps", "Focus traps"),
];

pub const SEO_AUDITS: [(&str, &str); 9] = [
    ("meta-description", "Meta description"),
    ("document-title", "Document title"),
    ("structured-data", "Structured data"),
    ("robots-txt", "Robots.txt"),
    ("canonical", "Canonical links"),
    ("hreflang", "Hreflang"),
    ("is-crawlable", "Page is crawlable"),
    ("font-size", "Font size"),
    ("tap-targets", "Tap targets"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImpactTier {
    High,
    Medium,
    Low,
}

impl ImpactTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactTier::High => "High",
            ImpactTier::Medium => "Medium",
            ImpactTier::Low => "Low",
        }
    }

    fn from_savings_ms(savings: f64) -> Self {
        if savings > 1000.0 {
            ImpactTier::High
        } else if savings > 500.0 {
            ImpactTier::Medium
        } else {
            ImpactTier::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Critical,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::Warning => "Warning",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SeoStatus {
    Pass,
    Fail,
    Warning,
}

impl SeoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeoStatus::Pass => "Pass",
            SeoStatus::Fail => "Fail",
            SeoStatus::Warning => "Warning",
        }
    }

    fn from_score(score: Option<f64>) -> Self {
        match score {
            Some(s) if s == 1.0 => SeoStatus::Pass,
            Some(s) if s == 0.0 => SeoStatus::Fail,
            // Partial scores and null scores both read as Warning.
            _ => SeoStatus::Warning,
        }
    }
}

/// An optimization opportunity with a positive estimated savings.
#[derive(Debug, Clone, Serialize)]
pub struct Opportunity {
    pub url: String,
    pub device: DeviceClass,
    pub audit_id: String,
    pub title: String,
    pub description: String,
    pub score: f64,
    pub savings_ms: f64,
    pub impact: ImpactTier,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessibilityIssue {
    pub url: String,
    pub device: DeviceClass,
    pub audit_id: String,
    pub title: String,
    pub description: String,
    pub score: f64,
    pub severity: Severity,
    /// The `details.type` tag from the payload, "Unknown" when absent.
    pub impact: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeoDetail {
    pub url: String,
    pub device: DeviceClass,
    pub audit_id: String,
    pub title: String,
    pub description: String,
    pub score: Option<f64>,
    pub status: SeoStatus,
    pub display_value: String,
}

fn title_or(audit_title: &str, fallback: &str) -> String {
    if audit_title.trim().is_empty() {
        fallback.to_string()
    } else {
        audit_title.to_string()
    }
}

/// Catalog audits with a failing score and a positive estimated savings.
/// Zero, negative, or absent savings skip the audit even when it failed.
pub fn mine_opportunities(
    payload: &LighthousePayload,
    device: DeviceClass,
    url: &str,
) -> Vec<Opportunity> {
    let mut opportunities = Vec::new();

    for (audit_id, fallback_title) in OPPORTUNITY_AUDITS {
        let Some(audit) = payload.audits.get(audit_id) else {
            continue;
        };
        let Some(score) = audit.score else {
            continue;
        };
        if score >= 1.0 {
            continue;
        }
        let savings = audit.overall_savings_ms().unwrap_or(0.0);
        if savings <= 0.0 {
            continue;
        }
        opportunities.push(Opportunity {
            url: url.to_string(),
            device,
            audit_id: audit_id.to_string(),
            title: title_or(&audit.title, fallback_title),
            description: audit.description.clone(),
            score,
            savings_ms: savings,
            impact: ImpactTier::from_savings_ms(savings),
        });
    }

    opportunities
}

/// Catalog audits with a failing score. Critical when the score is
/// exactly zero, otherwise Warning.
pub fn mine_accessibility_issues(
    payload: &LighthousePayload,
    device: DeviceClass,
    url: &str,
) -> Vec<AccessibilityIssue> {
    let mut issues = Vec::new();

    for (audit_id, fallback_title) in ACCESSIBILITY_AUDITS {
        let Some(audit) = payload.audits.get(audit_id) else {
            continue;
        };
        let Some(score) = audit.score else {
            continue;
        };
        if score >= 1.0 {
            continue;
        }
        let severity = if score == 0.0 {
            Severity::Critical
        } else {
            Severity::Warning
        };
        let impact = audit
            .details
            .as_ref()
            .and_then(|d| d.get("type"))
            .and_then(|t| t.as_str())
            .unwrap_or("Unknown")
            .to_string();
        issues.push(AccessibilityIssue {
            url: url.to_string(),
            device,
            audit_id: audit_id.to_string(),
            title: title_or(&audit.title, fallback_title),
            description: audit.description.clone(),
            score,
            severity,
            impact,
        });
    }

    issues
}

/// Every catalog SEO audit present in the payload, regardless of score.
pub fn mine_seo_details(
    payload: &LighthousePayload,
    device: DeviceClass,
    url: &str,
) -> Vec<SeoDetail> {
    let mut details = Vec::new();

    for (audit_id, fallback_title) in SEO_AUDITS {
        let Some(audit) = payload.audits.get(audit_id) else {
            continue;
        };
        details.push(SeoDetail {
            url: url.to_string(),
            device,
            audit_id: audit_id.to_string(),
            title: title_or(&audit.title, fallback_title),
            description: audit.description.clone(),
            score: audit.score,
            status: SeoStatus::from_score(audit.score),
            display_value: audit.display_value.clone().unwrap_or_default(),
        });
    }

    details
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(audits: serde_json::Value) -> LighthousePayload {
        LighthousePayload::from_value(json!({ "audits": audits })).unwrap()
    }

    #[test]
    fn test_opportunity_impact_tiers() {
        let payload = payload(json!({
            "uses-optimized-images": {
                "title": "Efficiently encode images",
                "score": 0.9,
                "details": { "overallSavingsMs": 1200 }
            },
            "unused-css-rules": {
                "title": "Remove unused CSS",
                "score": 0.4,
                "details": { "overallSavingsMs": 700 }
            },
            "render-blocking-resources": {
                "title": "Eliminate render-blocking resources",
                "score": 0.5,
                "details": { "overallSavingsMs": 300 }
            }
        }));

        let mined = mine_opportunities(&payload, DeviceClass::Mobile, "https://example.com");
        assert_eq!(mined.len(), 3);

        // Scenario: score 0.9 still mines when savings exceed 1000 ms.
        let high = mined.iter().find(|o| o.audit_id == "uses-optimized-images").unwrap();
        assert_eq!(high.impact, ImpactTier::High);
        assert_eq!(high.savings_ms, 1200.0);

        let medium = mined.iter().find(|o| o.audit_id == "unused-css-rules").unwrap();
        assert_eq!(medium.impact, ImpactTier::Medium);

        let low = mined
            .iter()
            .find(|o| o.audit_id == "render-blocking-resources")
            .unwrap();
        assert_eq!(low.impact, ImpactTier::Low);
    }

    #[test]
    fn test_opportunities_skip_zero_savings_and_passing_scores() {
        let payload = payload(json!({
            "unminified-css": { "score": 0.2, "details": { "overallSavingsMs": 0 } },
            "unminified-javascript": { "score": 0.2 },
            "uses-http2": { "score": 1.0, "details": { "overallSavingsMs": 5000 } },
            "modern-image-formats": { "score": null, "details": { "overallSavingsMs": 900 } }
        }));

        assert!(mine_opportunities(&payload, DeviceClass::Desktop, "https://example.com").is_empty());
    }

    #[test]
    fn test_accessibility_severity() {
        let payload = payload(json!({
            "color-contrast": {
                "title": "Background and foreground colors have sufficient contrast",
                "score": 0,
                "details": { "type": "table" }
            },
            "image-alt": { "title": "Image elements have [alt] attributes", "score": 0.5 },
            "link-name": { "score": 1.0 }
        }));

        let mined =
            mine_accessibility_issues(&payload, DeviceClass::Mobile, "https://example.com");
        assert_eq!(mined.len(), 2);

        let critical = mined.iter().find(|i| i.audit_id == "color-contrast").unwrap();
        assert_eq!(critical.severity, Severity::Critical);
        assert_eq!(critical.impact, "table");

        let warning = mined.iter().find(|i| i.audit_id == "image-alt").unwrap();
        assert_eq!(warning.severity, Severity::Warning);
        assert_eq!(warning.impact, "Unknown");
    }

    #[test]
    fn test_seo_status_per_score() {
        let payload = payload(json!({
            "document-title": { "title": "Document has a <title> element", "score": 1.0 },
            "meta-description": { "title": "Document has a meta description", "score": 0.0 },
            "tap-targets": { "title": "Tap targets are sized appropriately", "score": 0.66,
                             "displayValue": "85% appropriately sized tap targets" },
            "canonical": { "title": "Document has a valid rel=canonical", "score": null }
        }));

        let mined = mine_seo_details(&payload, DeviceClass::Mobile, "https://example.com");
        assert_eq!(mined.len(), 4);

        let by_id = |id: &str| mined.iter().find(|d| d.audit_id == id).unwrap();
        assert_eq!(by_id("document-title").status, SeoStatus::Pass);
        assert_eq!(by_id("meta-description").status, SeoStatus::Fail);
        assert_eq!(by_id("tap-targets").status, SeoStatus::Warning);
        // Scenario: null score reads as Warning, not Fail.
        assert_eq!(by_id("canonical").status, SeoStatus::Warning);
        assert_eq!(by_id("canonical").score, None);
        assert_eq!(
            by_id("tap-targets").display_value,
            "85% appropriately sized tap targets"
        );
    }

    #[test]
    fn test_records_are_tagged_with_url_and_device() {
        let payload = payload(json!({
            "robots-txt": { "score": 1.0 }
        }));

        let mobile = mine_seo_details(&payload, DeviceClass::Mobile, "https://a.example");
        let desktop = mine_seo_details(&payload, DeviceClass::Desktop, "https://a.example");
        assert_eq!(mobile[0].device, DeviceClass::Mobile);
        assert_eq!(desktop[0].device, DeviceClass::Desktop);
        assert_eq!(mobile[0].url, "https://a.example");
    }
}
