//! Filesystem plan library: Implementation of PlanResolver.
//!
//! Loads one PNG per risk tier once at startup. A file that is missing,
//! unreadable or not a PNG is logged and left out; scoring still works,
//! the result just carries no plan.

use std::collections::HashMap;
use std::path::Path;

use crate::domain::{PlanAsset, RiskTier};
use crate::ports::PlanResolver;

const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// File name of the plan image for a tier.
#[must_use]
pub fn plan_file_name(tier: RiskTier) -> String {
    format!("{}.png", tier.plan_name())
}

/// Plan images keyed by tier.
#[derive(Debug, Default)]
pub struct PlanLibrary {
    assets: HashMap<RiskTier, PlanAsset>,
}

impl PlanLibrary {
    /// Load every tier's plan from `dir`. Never fails.
    #[must_use]
    pub fn load(dir: &Path) -> Self {
        let mut assets = HashMap::new();

        for tier in RiskTier::ALL {
            let path = dir.join(plan_file_name(tier));
            match Self::load_one(&path) {
                Ok(bytes) => {
                    tracing::debug!("Loaded {} ({} bytes)", tier.plan_name(), bytes.len());
                    assets.insert(tier, PlanAsset::new(tier, path, bytes));
                }
                Err(reason) => {
                    tracing::warn!("Could not load {:?}: {reason}", path);
                }
            }
        }

        tracing::info!(
            "Plan library ready: {}/{} plans loaded from {:?}",
            assets.len(),
            RiskTier::ALL.len(),
            dir
        );

        Self { assets }
    }

    fn load_one(path: &Path) -> Result<Vec<u8>, String> {
        let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
        if !bytes.starts_with(&PNG_MAGIC) {
            return Err("not a PNG image".to_string());
        }
        Ok(bytes)
    }

    /// Tiers whose plan could not be loaded.
    #[must_use]
    pub fn missing(&self) -> Vec<RiskTier> {
        RiskTier::ALL
            .into_iter()
            .filter(|t| !self.assets.contains_key(t))
            .collect()
    }
}

impl PlanResolver for PlanLibrary {
    fn resolve(&self, tier: RiskTier) -> Option<&PlanAsset> {
        self.assets.get(&tier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fake_png(payload: &[u8]) -> Vec<u8> {
        let mut bytes = PNG_MAGIC.to_vec();
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn test_loads_all_plans() {
        let temp = tempdir().expect("tempdir");
        for tier in RiskTier::ALL {
            std::fs::write(temp.path().join(plan_file_name(tier)), fake_png(b"x")).expect("write");
        }

        let library = PlanLibrary::load(temp.path());
        assert!(library.missing().is_empty());
        let plan = library.resolve(RiskTier::Moderate).expect("loaded");
        assert_eq!(plan.reference().name, "Improvement Plan");
        assert!(plan.as_bytes().starts_with(&PNG_MAGIC));
    }

    #[test]
    fn test_missing_and_invalid_files_degrade() {
        let temp = tempdir().expect("tempdir");
        std::fs::write(
            temp.path().join("Maintenance Plan.png"),
            fake_png(b"ok"),
        )
        .expect("write");
        std::fs::write(temp.path().join("Intervention Plan.png"), b"GIF89a").expect("write");

        let library = PlanLibrary::load(temp.path());
        assert!(library.resolve(RiskTier::Low).is_some());
        assert!(library.resolve(RiskTier::VeryHigh).is_none());
        assert_eq!(
            library.missing(),
            vec![RiskTier::Moderate, RiskTier::High, RiskTier::VeryHigh]
        );
    }

    #[test]
    fn test_missing_directory_is_not_fatal() {
        let library = PlanLibrary::load(Path::new("/nonexistent/glycorisk/plans"));
        assert_eq!(library.missing().len(), 4);
    }
}
