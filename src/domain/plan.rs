//! Lifestyle plan assets attached to a risk tier.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::assessment::RiskTier;

/// SHA-256 of `bytes`, lowercase hex.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// A loaded plan image.
#[derive(Clone)]
pub struct PlanAsset {
    pub tier: RiskTier,
    pub path: std::path::PathBuf,
    bytes: Vec<u8>,
    fingerprint: String,
}

impl PlanAsset {
    #[must_use]
    pub fn new(tier: RiskTier, path: impl Into<std::path::PathBuf>, bytes: Vec<u8>) -> Self {
        let fingerprint = sha256_hex(&bytes);
        Self {
            tier,
            path: path.into(),
            bytes,
            fingerprint,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Serializable reference to this asset (no image bytes).
    #[must_use]
    pub fn reference(&self) -> PlanReference {
        PlanReference {
            name: self.tier.plan_name().to_string(),
            path: self.path.display().to_string(),
            size_bytes: self.bytes.len(),
            sha256: self.fingerprint.clone(),
        }
    }
}

// Keep image bytes out of logs.
impl std::fmt::Debug for PlanAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanAsset")
            .field("tier", &self.tier)
            .field("path", &self.path)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

/// What a `ScoreResult` carries about its plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanReference {
    /// Plan display name, e.g. "Maintenance Plan"
    pub name: String,
    pub path: String,
    pub size_bytes: usize,
    pub sha256: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_carries_fingerprint() {
        let asset = PlanAsset::new(RiskTier::High, "plans/Mitigation Plan.png", b"abc".to_vec());
        let reference = asset.reference();

        assert_eq!(reference.name, "Mitigation Plan");
        assert_eq!(reference.size_bytes, 3);
        assert_eq!(
            reference.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert!(!format!("{asset:?}").contains("97, 98, 99"));
    }

    #[test]
    fn test_sha256_hex_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
