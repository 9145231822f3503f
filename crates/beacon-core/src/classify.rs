//! Core Web Vitals classification.
//!
//! One threshold table serves every consumer (console report, HTML
//! dashboard); the extraction path never classifies, it only normalizes.

use crate::normalize::MetricKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    Good,
    NeedsImprovement,
    Poor,
    /// Unrecognized metric kind or unparseable value.
    Unknown,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Good => "good",
            Rating::NeedsImprovement => "needs-improvement",
            Rating::Poor => "poor",
            Rating::Unknown => "unknown",
        }
    }
}

/// (kind, good boundary, poor boundary) in the metric's base unit.
/// A value is Good when <= the good boundary, Poor when > the poor
/// boundary, NeedsImprovement in between. Boundaries are inclusive to the
/// better tier: exactly 1.8 s FCP is Good.
pub const THRESHOLDS: [(MetricKind, f64, f64); 5] = [
    (MetricKind::FirstContentfulPaint, 1.8, 3.0),
    (MetricKind::LargestContentfulPaint, 2.5, 4.0),
    (MetricKind::TotalBlockingTime, 200.0, 600.0),
    (MetricKind::CumulativeLayoutShift, 0.10, 0.25),
    (MetricKind::SpeedIndex, 3.4, 5.8),
];

/// Classify a canonical metric value. Kinds without a threshold entry
/// (time-to-interactive, first-meaningful-paint) classify as Unknown.
pub fn classify_metric(kind: MetricKind, value: Option<f64>) -> Rating {
    let Some(value) = value else {
        return Rating::Unknown;
    };
    let Some(&(_, good, poor)) = THRESHOLDS.iter().find(|(k, _, _)| *k == kind) else {
        return Rating::Unknown;
    };
    if value <= good {
        Rating::Good
    } else if value <= poor {
        Rating::NeedsImprovement
    } else {
        Rating::Poor
    }
}

/// Classify a 0-100 category score: >= 90 Good, < 50 Poor.
pub fn classify_score(score: Option<i64>) -> Rating {
    match score {
        Some(s) if s >= 90 => Rating::Good,
        Some(s) if s < 50 => Rating::Poor,
        Some(_) => Rating::NeedsImprovement,
        None => Rating::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_are_inclusive_to_the_better_tier() {
        assert_eq!(
            classify_metric(MetricKind::FirstContentfulPaint, Some(1.8)),
            Rating::Good
        );
        assert_eq!(
            classify_metric(MetricKind::FirstContentfulPaint, Some(1.80001)),
            Rating::NeedsImprovement
        );
        assert_eq!(
            classify_metric(MetricKind::FirstContentfulPaint, Some(3.0)),
            Rating::NeedsImprovement
        );
        assert_eq!(
            classify_metric(MetricKind::FirstContentfulPaint, Some(3.00001)),
            Rating::Poor
        );
        // An LCP display of "2,500 ms" normalizes to exactly the good
        // boundary and must classify Good.
        assert_eq!(
            classify_metric(MetricKind::LargestContentfulPaint, Some(2.5)),
            Rating::Good
        );
    }

    #[test]
    fn test_classification_is_monotonic() {
        fn severity(r: Rating) -> u8 {
            match r {
                Rating::Good => 0,
                Rating::NeedsImprovement => 1,
                Rating::Poor => 2,
                Rating::Unknown => unreachable!("thresholded kinds never rate Unknown"),
            }
        }

        for (kind, good, poor) in THRESHOLDS {
            let probes = [
                0.0,
                good * 0.5,
                good,
                good + (poor - good) * 0.5,
                poor,
                poor * 1.5,
                poor * 10.0,
            ];
            for pair in probes.windows(2) {
                let lo = severity(classify_metric(kind, Some(pair[0])));
                let hi = severity(classify_metric(kind, Some(pair[1])));
                assert!(lo <= hi, "{:?}: rating regressed between {} and {}", kind, pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn test_unknown_for_unparsed_or_unthresholded() {
        assert_eq!(classify_metric(MetricKind::SpeedIndex, None), Rating::Unknown);
        assert_eq!(
            classify_metric(MetricKind::TimeToInteractive, Some(1.0)),
            Rating::Unknown
        );
        assert_eq!(
            classify_metric(MetricKind::FirstMeaningfulPaint, Some(1.0)),
            Rating::Unknown
        );
    }

    #[test]
    fn test_category_score_bands() {
        assert_eq!(classify_score(Some(90)), Rating::Good);
        assert_eq!(classify_score(Some(89)), Rating::NeedsImprovement);
        // Scenario: category score 0.85 extracts to 85, rated
        // needs-improvement.
        assert_eq!(classify_score(Some(85)), Rating::NeedsImprovement);
        assert_eq!(classify_score(Some(50)), Rating::NeedsImprovement);
        assert_eq!(classify_score(Some(49)), Rating::Poor);
        assert_eq!(classify_score(None), Rating::Unknown);
    }
}
