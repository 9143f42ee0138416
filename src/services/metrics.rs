//! KPI aggregation over the user risk listing
//!
//! Pure functions: no I/O, no shared state.

use serde::Serialize;

use crate::models::UserRiskRecord;
use crate::services::risk_classifier::RiskTier;

/// Number of histogram buckets
pub const HISTOGRAM_BUCKETS: usize = 5;

/// Width of a histogram bucket in score points
const BUCKET_WIDTH: f64 = 20.0;

/// Display labels for the histogram buckets
pub const HISTOGRAM_LABELS: [&str; HISTOGRAM_BUCKETS] = ["0-20", "21-40", "41-60", "61-80", "81-100"];

/// Record counts per risk tier
#[derive(Debug, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierComposition {
    pub safe: usize,
    pub medium: usize,
    pub high: usize,
}

impl TierComposition {
    pub fn total(&self) -> usize {
        self.safe + self.medium + self.high
    }

    pub fn count(&self, tier: RiskTier) -> usize {
        match tier {
            RiskTier::Safe => self.safe,
            RiskTier::Medium => self.medium,
            RiskTier::High => self.high,
        }
    }

    fn record(&mut self, tier: RiskTier) {
        match tier {
            RiskTier::Safe => self.safe += 1,
            RiskTier::Medium => self.medium += 1,
            RiskTier::High => self.high += 1,
        }
    }
}

/// Aggregate figures behind the dashboard KPIs and charts
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RiskMetrics {
    pub total: usize,
    pub high_risk_count: usize,
    pub mean_score: f64,
    pub histogram: [usize; HISTOGRAM_BUCKETS],
    pub composition: TierComposition,
}

impl RiskMetrics {
    /// Mean score rounded for display, e.g. "36.7"
    pub fn mean_score_display(&self) -> String {
        format!("{:.1}", self.mean_score)
    }
}

/// Histogram bucket for a score: [0,20), [20,40), [40,60), [60,80), [80,100]
pub fn bucket_index(score: f64) -> usize {
    let raw = (score / BUCKET_WIDTH).floor();
    // NaN and negatives land in the first bucket, anything from 80 up in the last
    if raw.is_nan() || raw < 0.0 {
        0
    } else {
        (raw as usize).min(HISTOGRAM_BUCKETS - 1)
    }
}

/// Compute totals, mean, histogram and tier composition in one pass
pub fn aggregate(records: &[UserRiskRecord]) -> RiskMetrics {
    let mut histogram = [0usize; HISTOGRAM_BUCKETS];
    let mut composition = TierComposition::default();
    let mut score_sum = 0.0;

    for record in records {
        let score = record.overall_risk_score;
        histogram[bucket_index(score)] += 1;
        composition.record(RiskTier::from_score(score));
        score_sum += score;
    }

    let total = records.len();
    let mean_score = if total == 0 {
        0.0
    } else {
        score_sum / total as f64
    };

    RiskMetrics {
        total,
        high_risk_count: composition.high,
        mean_score,
        histogram,
        composition,
    }
}

/// Records at Medium tier or above, highest score first, truncated to `limit`
///
/// The sort is stable so equal scores keep their listing order.
pub fn elevated(records: &[UserRiskRecord], limit: Option<usize>) -> Vec<&UserRiskRecord> {
    let mut rows: Vec<&UserRiskRecord> = records
        .iter()
        .filter(|r| r.classification().tier.is_elevated())
        .collect();

    rows.sort_by(|a, b| b.overall_risk_score.total_cmp(&a.overall_risk_score));

    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(scores: &[f64]) -> Vec<UserRiskRecord> {
        scores
            .iter()
            .enumerate()
            .map(|(i, s)| UserRiskRecord::new(i as i64 + 1, *s))
            .collect()
    }

    #[test]
    fn test_empty_listing() {
        let metrics = aggregate(&[]);
        assert_eq!(metrics.total, 0);
        assert_eq!(metrics.mean_score, 0.0);
        assert_eq!(metrics.histogram, [0; 5]);
        assert_eq!(metrics.composition.total(), 0);
        assert_eq!(metrics.mean_score_display(), "0.0");
    }

    #[test]
    fn test_three_tier_scenario() {
        let metrics = aggregate(&records(&[65.0, 35.0, 10.0]));
        assert_eq!(
            metrics.composition,
            TierComposition {
                safe: 1,
                medium: 1,
                high: 1
            }
        );
        assert_eq!(metrics.high_risk_count, 1);
        assert!((metrics.mean_score - 36.666_666).abs() < 1e-3);
        assert_eq!(metrics.mean_score_display(), "36.7");
    }

    #[test]
    fn test_bucket_edges() {
        assert_eq!(bucket_index(0.0), 0);
        assert_eq!(bucket_index(19.99), 0);
        assert_eq!(bucket_index(20.0), 1);
        assert_eq!(bucket_index(59.9), 2);
        assert_eq!(bucket_index(60.0), 3);
        assert_eq!(bucket_index(80.0), 4);
        assert_eq!(bucket_index(100.0), 4);
        assert_eq!(bucket_index(140.0), 4);
        assert_eq!(bucket_index(-3.0), 0);
        assert_eq!(bucket_index(f64::NAN), 0);
    }

    #[test]
    fn test_histogram_sums_to_total() {
        let metrics = aggregate(&records(&[0.0, 20.0, 39.9, 40.0, 61.5, 79.9, 80.0, 100.0]));
        assert_eq!(metrics.histogram, [1, 2, 1, 2, 2]);
        assert_eq!(metrics.histogram.iter().sum::<usize>(), metrics.total);
    }

    #[test]
    fn test_elevated_sorted_and_limited() {
        let listing = records(&[12.0, 45.0, 91.0, 30.0, 60.0, 29.99]);
        let rows = elevated(&listing, None);
        let scores: Vec<f64> = rows.iter().map(|r| r.overall_risk_score).collect();
        assert_eq!(scores, vec![91.0, 60.0, 45.0, 30.0]);

        let top = elevated(&listing, Some(2));
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].user_id, 3);
    }

    #[test]
    fn test_elevated_keeps_listing_order_on_ties() {
        let listing = records(&[50.0, 50.0, 50.0]);
        let ids: Vec<i64> = elevated(&listing, None).iter().map(|r| r.user_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
