//! Plan resolver port: Maps a risk tier to its lifestyle plan asset.

use crate::domain::{PlanAsset, RiskTier};

/// Trait for looking up loaded plan assets.
///
/// A missing asset is not an error: callers degrade to a result without a plan.
pub trait PlanResolver: Send + Sync {
    /// Get the plan for a tier, if one was loaded.
    fn resolve(&self, tier: RiskTier) -> Option<&PlanAsset>;
}
