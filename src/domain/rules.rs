//! Clinical threshold overrides on HbA1c and blood glucose.
//!
//! Lab-confirmed diagnostic ranges take precedence over the model estimate.
//! Rules are checked in order and the first match wins:
//!
//! 1. Diabetic range: HbA1c >= 6.5 or glucose >= 140
//! 2. Prediabetic range: HbA1c in [5.7, 6.5) or glucose in [117, 140)
//! 3. Normal range: HbA1c < 5.7 and glucose < 117 (only if the policy enables it)
//!
//! A missing lab value never satisfies a threshold.

use serde::{Deserialize, Serialize};

use super::assessment::{RiskTier, TierSource};

pub const HBA1C_DIABETIC: f64 = 6.5;
pub const HBA1C_PREDIABETIC: f64 = 5.7;
pub const GLUCOSE_DIABETIC: f64 = 140.0;
pub const GLUCOSE_PREDIABETIC: f64 = 117.0;

/// Which clinical rule fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClinicalRule {
    DiabeticRange,
    PrediabeticRange,
    NormalRange,
}

/// How a rule rewrites the model probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum ProbabilityAdjustment {
    /// Replace the probability.
    Pin(f64),
    /// Raise the probability to at least this value.
    Floor(f64),
}

impl ProbabilityAdjustment {
    #[must_use]
    pub fn apply(self, model_percent: f64) -> f64 {
        match self {
            Self::Pin(v) => v,
            Self::Floor(v) => model_percent.max(v),
        }
    }
}

/// Override values for each band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RulePolicy {
    pub diabetic: ProbabilityAdjustment,
    pub prediabetic: ProbabilityAdjustment,
    /// `None` disables the normal-range override.
    pub normal: Option<ProbabilityAdjustment>,
}

impl RulePolicy {
    /// Diabetic pinned at 100, prediabetic floored at 60, no normal-range override.
    #[must_use]
    pub fn floor() -> Self {
        Self {
            diabetic: ProbabilityAdjustment::Pin(100.0),
            prediabetic: ProbabilityAdjustment::Floor(60.0),
            normal: None,
        }
    }

    /// Diabetic pinned at 90, prediabetic pinned at 55, normal range pinned at 10.
    #[must_use]
    pub fn pinned() -> Self {
        Self {
            diabetic: ProbabilityAdjustment::Pin(90.0),
            prediabetic: ProbabilityAdjustment::Pin(55.0),
            normal: Some(ProbabilityAdjustment::Pin(10.0)),
        }
    }

    /// Decide the final probability and tier.
    ///
    /// `model_percent` is the model probability in percent. Lab values must
    /// already have the zero policy applied and must not be imputed.
    #[must_use]
    pub fn evaluate(
        &self,
        model_percent: f64,
        hba1c: Option<f64>,
        glucose: Option<f64>,
    ) -> RuleDecision {
        let hba1c_at_least = |t: f64| hba1c.is_some_and(|v| v >= t);
        let glucose_at_least = |t: f64| glucose.is_some_and(|v| v >= t);

        let fired = if hba1c_at_least(HBA1C_DIABETIC) || glucose_at_least(GLUCOSE_DIABETIC) {
            Some((ClinicalRule::DiabeticRange, self.diabetic, RiskTier::VeryHigh))
        } else if hba1c_at_least(HBA1C_PREDIABETIC) || glucose_at_least(GLUCOSE_PREDIABETIC) {
            Some((ClinicalRule::PrediabeticRange, self.prediabetic, RiskTier::High))
        } else {
            // Neither lab reached a threshold; the normal band needs both readings.
            match (self.normal, hba1c, glucose) {
                (Some(adjustment), Some(_), Some(_)) => {
                    Some((ClinicalRule::NormalRange, adjustment, RiskTier::Low))
                }
                _ => None,
            }
        };

        match fired {
            Some((rule, adjustment, tier)) => RuleDecision {
                probability: adjustment.apply(model_percent).clamp(0.0, 100.0),
                tier,
                source: TierSource::Rule(rule),
            },
            None => RuleDecision {
                probability: model_percent,
                tier: RiskTier::from_probability(model_percent),
                source: TierSource::Model,
            },
        }
    }
}

impl Default for RulePolicy {
    fn default() -> Self {
        Self::floor()
    }
}

impl std::str::FromStr for RulePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "floor" => Ok(Self::floor()),
            "pinned" => Ok(Self::pinned()),
            other => Err(format!(
                "unknown rule policy '{other}' (expected floor or pinned)"
            )),
        }
    }
}

/// Final probability and tier after the override rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleDecision {
    pub probability: f64,
    pub tier: RiskTier,
    pub source: TierSource,
}
