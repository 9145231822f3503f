//! Unit normalization for timing metrics.
//!
//! Lighthouse reports metric values three ways: a formatted display string
//! ("2,500 ms", "1.2 s"), a raw millisecond numeric, or nothing at all.
//! Everything downstream (thresholding, averaging) wants a single
//! canonical number per metric, in that metric's base unit.

use serde::{Deserialize, Serialize};

/// The seven timing metrics extracted from the audit map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    FirstContentfulPaint,
    LargestContentfulPaint,
    TotalBlockingTime,
    CumulativeLayoutShift,
    SpeedIndex,
    TimeToInteractive,
    FirstMeaningfulPaint,
}

/// Base unit a metric's canonical value is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Seconds,
    Milliseconds,
    Unitless,
}

impl MetricKind {
    /// Catalog order, which is also the CSV column order within a device.
    pub const ALL: [MetricKind; 7] = [
        MetricKind::FirstContentfulPaint,
        MetricKind::LargestContentfulPaint,
        MetricKind::TotalBlockingTime,
        MetricKind::CumulativeLayoutShift,
        MetricKind::SpeedIndex,
        MetricKind::TimeToInteractive,
        MetricKind::FirstMeaningfulPaint,
    ];

    /// Audit key in the Lighthouse payload.
    pub fn audit_key(&self) -> &'static str {
        match self {
            MetricKind::FirstContentfulPaint => "first-contentful-paint",
            MetricKind::LargestContentfulPaint => "largest-contentful-paint",
            MetricKind::TotalBlockingTime => "total-blocking-time",
            MetricKind::CumulativeLayoutShift => "cumulative-layout-shift",
            MetricKind::SpeedIndex => "speed-index",
            MetricKind::TimeToInteractive => "interactive",
            MetricKind::FirstMeaningfulPaint => "first-meaningful-paint",
        }
    }

    /// Column suffix in the tabular store (device prefix added later).
    pub fn column_key(&self) -> &'static str {
        match self {
            MetricKind::FirstContentfulPaint => "first_contentful_paint",
            MetricKind::LargestContentfulPaint => "largest_contentful_paint",
            MetricKind::TotalBlockingTime => "total_blocking_time",
            MetricKind::CumulativeLayoutShift => "cumulative_layout_shift",
            MetricKind::SpeedIndex => "speed_index",
            MetricKind::TimeToInteractive => "time_to_interactive",
            MetricKind::FirstMeaningfulPaint => "first_meaningful_paint",
        }
    }

    pub fn from_audit_key(key: &str) -> Option<MetricKind> {
        MetricKind::ALL.into_iter().find(|k| k.audit_key() == key)
    }

    /// Match a rendered metric title ("First Contentful Paint") back to its
    /// kind. Used by the DOM-snapshot extractor, where audit keys are not
    /// available.
    pub fn from_title(title: &str) -> Option<MetricKind> {
        let key = title.trim().to_lowercase().replace(' ', "_");
        MetricKind::ALL
            .into_iter()
            .find(|k| k.column_key() == key || (key == "interactive" && *k == MetricKind::TimeToInteractive))
    }

    pub fn unit(&self) -> Unit {
        match self {
            MetricKind::CumulativeLayoutShift => Unit::Unitless,
            MetricKind::TotalBlockingTime => Unit::Milliseconds,
            _ => Unit::Seconds,
        }
    }
}

/// A normalized metric: the display string shown to humans plus the
/// canonical base-unit value used for thresholding. `value` is None when
/// the display string could not be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricValue {
    pub display: String,
    pub value: Option<f64>,
}

impl MetricValue {
    /// Normalize one audit's raw value pair. Returns None when the audit
    /// carried neither a display string nor a numeric value; that metric is
    /// then omitted from the record entirely.
    pub fn from_raw(kind: MetricKind, display: Option<&str>, numeric: Option<f64>) -> Option<Self> {
        match (display.filter(|d| !d.trim().is_empty()), numeric) {
            (Some(display), numeric) => Some(MetricValue {
                display: display.to_string(),
                // The raw numeric is exact when present; otherwise fall
                // back to re-parsing the display string.
                value: numeric
                    .map(|n| canonical_from_numeric(kind, n))
                    .or_else(|| parse_display(kind, display)),
            }),
            (None, Some(numeric)) => Some(MetricValue {
                display: synthesize_display(kind, numeric),
                value: Some(canonical_from_numeric(kind, numeric)),
            }),
            (None, None) => None,
        }
    }
}

/// Parse a formatted display value into the metric's base unit.
/// "2,500 ms" for largest-contentful-paint → 2.5 (seconds).
/// Malformed strings yield None; this is a normal branch, not an error.
pub fn parse_display(kind: MetricKind, raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', "");
    let cleaned = cleaned.trim();

    let (number, unit) = if let Some(stripped) = cleaned.strip_suffix("ms") {
        (stripped.trim(), Some(Unit::Milliseconds))
    } else if let Some(stripped) = cleaned.strip_suffix('s') {
        (stripped.trim(), Some(Unit::Seconds))
    } else {
        (cleaned, None)
    };

    let value: f64 = number.parse().ok()?;

    let base = kind.unit();
    let source = unit.unwrap_or(base);
    Some(match (source, base) {
        (Unit::Milliseconds, Unit::Seconds) => value / 1000.0,
        (Unit::Seconds, Unit::Milliseconds) => value * 1000.0,
        _ => value,
    })
}

/// Convert a raw Lighthouse numeric (milliseconds for timers, unitless for
/// layout shift) into the metric's base unit.
pub fn canonical_from_numeric(kind: MetricKind, raw: f64) -> f64 {
    match kind.unit() {
        Unit::Seconds => raw / 1000.0,
        Unit::Milliseconds | Unit::Unitless => raw,
    }
}

/// Synthesize a display string from a raw numeric value when the payload
/// did not supply one. Millisecond-denominated values of a second or more
/// render in seconds.
pub fn synthesize_display(kind: MetricKind, raw: f64) -> String {
    if kind == MetricKind::CumulativeLayoutShift {
        return format!("{:.3}", raw);
    }
    if raw >= 1000.0 {
        format!("{:.2} s", raw / 1000.0)
    } else {
        format!("{:.0} ms", raw)
    }
}
