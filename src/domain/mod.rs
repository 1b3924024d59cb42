//! Domain layer: Core scoring types and logic.
//!
//! Pure Rust types with no I/O. Everything here is deterministic
//! for a given input and policy.

mod assessment;
mod features;
mod patient;
mod plan;
mod rules;

pub use assessment::{RiskTier, ScoreResult, TierSource};
pub use features::{
    FeatureColumn, FeatureVector, ImputedVector, LabZeroPolicy, FEATURE_COUNT, FEATURE_NAMES,
};
pub use patient::{Gender, PatientInput, SmokingHistory};
pub use plan::{sha256_hex, PlanAsset, PlanReference};
pub use rules::{ClinicalRule, ProbabilityAdjustment, RuleDecision, RulePolicy};
