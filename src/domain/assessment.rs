//! Risk tiers and the result of one scoring pass.

use serde::{Deserialize, Serialize};

use super::features::FeatureColumn;
use super::plan::PlanReference;
use super::rules::ClinicalRule;

/// Ordered diabetes risk tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    /// Below 25%
    Low,
    /// 25% to below 50%
    Moderate,
    /// 50% to below 75%
    High,
    /// 75% and above
    VeryHigh,
}

impl RiskTier {
    pub const ALL: [Self; 4] = [Self::Low, Self::Moderate, Self::High, Self::VeryHigh];

    /// Bucket a probability percentage.
    ///
    /// Buckets are half-open except the top one, which includes 100.
    /// Values outside [0, 100] are clamped first.
    #[must_use]
    pub fn from_probability(percent: f64) -> Self {
        let p = percent.clamp(0.0, 100.0);
        if p < 25.0 {
            Self::Low
        } else if p < 50.0 {
            Self::Moderate
        } else if p < 75.0 {
            Self::High
        } else {
            Self::VeryHigh
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::Moderate => "Moderate Risk",
            Self::High => "High Risk",
            Self::VeryHigh => "Very High Risk",
        }
    }

    /// Name of the lifestyle plan recommended for this tier.
    #[must_use]
    pub fn plan_name(&self) -> &'static str {
        match self {
            Self::Low => "Maintenance Plan",
            Self::Moderate => "Improvement Plan",
            Self::High => "Mitigation Plan",
            Self::VeryHigh => "Intervention Plan",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// What decided the final tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rule", rename_all = "snake_case")]
pub enum TierSource {
    /// The model probability, bucketed.
    Model,
    /// A clinical threshold rule.
    Rule(ClinicalRule),
}

/// Result of one scoring pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Final probability in percent (0-100)
    pub probability: f64,

    /// Model probability in percent, before any rule override
    pub model_probability: f64,

    pub tier: RiskTier,

    pub decided_by: TierSource,

    /// Derived BMI, if height was given
    pub bmi: Option<f64>,

    /// Columns filled in by imputation
    pub imputed: Vec<FeatureColumn>,

    /// Plan for the tier; absent when the asset could not be loaded
    pub plan: Option<PlanReference>,

    pub assessed_at: chrono::DateTime<chrono::Utc>,
}

impl ScoreResult {
    /// Whether a plan asset accompanies this result.
    #[must_use]
    pub fn plan_available(&self) -> bool {
        self.plan.is_some()
    }

    #[must_use]
    pub fn overridden(&self) -> bool {
        matches!(self.decided_by, TierSource::Rule(_))
    }
}

impl std::fmt::Display for ScoreResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Risk Stage: {} ({:.2}%)",
            self.tier, self.probability
        )?;
        match &self.plan {
            Some(plan) => write!(f, ", recommended: {}", plan.name),
            None => write!(f, ", lifestyle plan image not found"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(RiskTier::from_probability(0.0), RiskTier::Low);
        assert_eq!(RiskTier::from_probability(24.999), RiskTier::Low);
        assert_eq!(RiskTier::from_probability(25.0), RiskTier::Moderate);
        assert_eq!(RiskTier::from_probability(49.999), RiskTier::Moderate);
        assert_eq!(RiskTier::from_probability(50.0), RiskTier::High);
        assert_eq!(RiskTier::from_probability(74.999), RiskTier::High);
        assert_eq!(RiskTier::from_probability(75.0), RiskTier::VeryHigh);
        assert_eq!(RiskTier::from_probability(100.0), RiskTier::VeryHigh);
    }

    #[test]
    fn test_tiers_cover_range_monotonically() {
        let mut previous = RiskTier::Low;
        for step in 0..=10_000 {
            let p = f64::from(step) / 100.0;
            let tier = RiskTier::from_probability(p);
            assert!(tier >= previous, "tier decreased at {p}");
            previous = tier;
        }
        assert_eq!(previous, RiskTier::VeryHigh);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        assert_eq!(RiskTier::from_probability(-3.0), RiskTier::Low);
        assert_eq!(RiskTier::from_probability(140.0), RiskTier::VeryHigh);
    }

    #[test]
    fn test_plan_names() {
        let names: Vec<_> = RiskTier::ALL.iter().map(RiskTier::plan_name).collect();
        assert_eq!(
            names,
            [
                "Maintenance Plan",
                "Improvement Plan",
                "Mitigation Plan",
                "Intervention Plan"
            ]
        );
    }

    #[test]
    fn test_display_without_plan() {
        let result = ScoreResult {
            probability: 12.346,
            model_probability: 12.346,
            tier: RiskTier::Low,
            decided_by: TierSource::Model,
            bmi: None,
            imputed: Vec::new(),
            plan: None,
            assessed_at: chrono::Utc::now(),
        };
        assert_eq!(
            result.to_string(),
            "Risk Stage: Low Risk (12.35%), lifestyle plan image not found"
        );
        assert!(!result.overridden());
    }
}
