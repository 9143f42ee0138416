//! Risk tier classification
//!
//! Every view that shows a tier, badge or risk colour goes through
//! [`classify`]; the thresholds live nowhere else.

use serde::{Deserialize, Serialize};

/// Lower bound (inclusive) of the Medium tier
pub const MEDIUM_RISK_THRESHOLD: f64 = 30.0;

/// Lower bound (inclusive) of the High tier
pub const HIGH_RISK_THRESHOLD: f64 = 60.0;

/// Risk tier classification
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    /// Score below 30
    Safe,
    /// Score in [30, 60)
    Medium,
    /// Score of 60 or more
    High,
}

impl RiskTier {
    /// NaN and negative scores fall through to Safe.
    pub fn from_score(score: f64) -> Self {
        if score >= HIGH_RISK_THRESHOLD {
            RiskTier::High
        } else if score >= MEDIUM_RISK_THRESHOLD {
            RiskTier::Medium
        } else {
            RiskTier::Safe
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Safe => "Safe",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High Risk",
        }
    }

    pub fn style_key(&self) -> &'static str {
        match self {
            RiskTier::Safe => "badge-safe",
            RiskTier::Medium => "badge-medium",
            RiskTier::High => "badge-high",
        }
    }

    /// Colour used for gauges, donut slices and score dots
    pub fn color(&self) -> &'static str {
        match self {
            RiskTier::Safe => "#10b981",
            RiskTier::Medium => "#f59e0b",
            RiskTier::High => "#ef4444",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RiskTier::Safe => "No fraud indicators detected",
            RiskTier::Medium => "Elevated return activity, worth a manual look",
            RiskTier::High => "Return behaviour consistent with fraud",
        }
    }

    /// At least Medium; these users appear in the fraud table and previews
    pub fn is_elevated(&self) -> bool {
        *self >= RiskTier::Medium
    }

    pub fn all() -> [RiskTier; 3] {
        [RiskTier::Safe, RiskTier::Medium, RiskTier::High]
    }
}

/// Tier plus the display metadata every page renders for it
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct RiskClassification {
    pub tier: RiskTier,
    pub label: &'static str,
    pub style_key: &'static str,
    pub color: &'static str,
}

/// Classify a 0-100 risk score
pub fn classify(score: f64) -> RiskClassification {
    let tier = RiskTier::from_score(score);
    RiskClassification {
        tier,
        label: tier.label(),
        style_key: tier.style_key(),
        color: tier.color(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_are_exact() {
        assert_eq!(classify(29.9).tier, RiskTier::Safe);
        assert_eq!(classify(30.0).tier, RiskTier::Medium);
        assert_eq!(classify(59.9).tier, RiskTier::Medium);
        assert_eq!(classify(60.0).tier, RiskTier::High);
    }

    #[test]
    fn test_degenerate_scores() {
        assert_eq!(classify(f64::NAN).tier, RiskTier::Safe);
        assert_eq!(classify(-5.0).tier, RiskTier::Safe);
        assert_eq!(classify(250.0).tier, RiskTier::High);
    }

    #[test]
    fn test_display_metadata() {
        let high = classify(88.0);
        assert_eq!(high.label, "High Risk");
        assert_eq!(high.style_key, "badge-high");
        assert_eq!(high.color, "#ef4444");

        let medium = classify(45.0);
        assert_eq!(medium.label, "Medium");
        assert_eq!(medium.style_key, "badge-medium");

        let safe = classify(3.0);
        assert_eq!(safe.label, "Safe");
        assert_eq!(safe.style_key, "badge-safe");
    }

    #[test]
    fn test_tier_ordering() {
        assert!(RiskTier::Safe < RiskTier::Medium);
        assert!(RiskTier::Medium < RiskTier::High);
        assert!(!RiskTier::Safe.is_elevated());
        assert!(RiskTier::Medium.is_elevated());
        assert!(RiskTier::High.is_elevated());
    }

    #[test]
    fn test_descriptions_present() {
        for tier in RiskTier::all() {
            assert!(!tier.description().is_empty());
        }
    }
}
