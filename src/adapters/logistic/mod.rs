//! Logistic adapter: Implementation of RiskModel for an exported logistic regression.
//!
//! The training pipeline exports a standardized logistic regression as JSON
//! (`diabetes_model.json`): scaler mean/scale, coefficients, intercept and the
//! index of the diabetic class.
//!
//! # Artifact integrity
//!
//! A model directory may be signed with `sign_model`, which writes:
//! - `manifest.json`: SHA-256 of every bound file
//! - `model.sig`: Ed25519 signature over the exact manifest bytes
//!
//! With a configured verifying key, the loader checks the signature and every
//! bound hash before reading the model. Unsigned directories are refused unless
//! `allow_unsigned` is set, and that bypass only exists in debug builds.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::domain::{sha256_hex, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use crate::ports::{ModelError, RiskModel};

/// Model file name inside the model directory.
pub const MODEL_FILE: &str = "diabetes_model.json";

/// Signed manifest file name.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Detached Ed25519 signature over the manifest.
pub const SIGNATURE_FILE: &str = "model.sig";

/// Supported manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

/// Model parameters exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedLogisticModel {
    pub version: String,
    pub feature_names: Vec<String>,
    pub scaler_mean: Vec<f64>,
    pub scaler_scale: Vec<f64>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Index of the diabetic class in `[P(class 0), P(class 1)]`
    pub positive_class_index: usize,
}

impl ExportedLogisticModel {
    fn validate(&self) -> Result<(), ModelError> {
        if self.feature_names.len() != FEATURE_COUNT
            || self
                .feature_names
                .iter()
                .zip(FEATURE_NAMES.iter())
                .any(|(a, b)| a != b)
        {
            return Err(ModelError::Artifact(format!(
                "feature_names {:?} do not match expected columns {:?}",
                self.feature_names, FEATURE_NAMES
            )));
        }

        for (name, values) in [
            ("scaler_mean", &self.scaler_mean),
            ("scaler_scale", &self.scaler_scale),
            ("coefficients", &self.coefficients),
        ] {
            if values.len() != FEATURE_COUNT {
                return Err(ModelError::Artifact(format!(
                    "{name} has {} entries, expected {FEATURE_COUNT}",
                    values.len()
                )));
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(ModelError::Artifact(format!("{name} contains non-finite values")));
            }
        }

        if self.scaler_scale.iter().any(|s| *s == 0.0) {
            return Err(ModelError::Artifact("scaler_scale contains zero".into()));
        }
        if !self.intercept.is_finite() {
            return Err(ModelError::Artifact("intercept is not finite".into()));
        }
        if self.positive_class_index > 1 {
            return Err(ModelError::Artifact(format!(
                "positive_class_index {} out of range for a binary model",
                self.positive_class_index
            )));
        }
        Ok(())
    }
}

/// Signed list of files making up a model release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version: u32,
    /// Unix timestamp (seconds) when the manifest was signed
    #[serde(default)]
    pub created_at: Option<i64>,
    /// Relative file name -> SHA-256 hex
    pub files: BTreeMap<String, String>,
}

/// Trust settings for loading a model directory.
#[derive(Debug, Clone, Default)]
pub struct ModelTrust {
    pub verifying_key: Option<VerifyingKey>,
    /// Permit unsigned models. Ignored in release builds.
    pub allow_unsigned: bool,
}

impl ModelTrust {
    /// Trust a base64-encoded Ed25519 public key.
    ///
    /// # Errors
    /// Returns `ModelError::Signature` if the key is not 32 valid bytes.
    pub fn from_public_key_b64(b64: &str) -> Result<Self, ModelError> {
        Ok(Self {
            verifying_key: Some(verifying_key_from_b64(b64)?),
            allow_unsigned: false,
        })
    }

    #[must_use]
    pub fn allowing_unsigned(mut self, allow: bool) -> Self {
        self.allow_unsigned = allow;
        self
    }

    fn unsigned_permitted(&self) -> bool {
        cfg!(debug_assertions) && self.allow_unsigned
    }
}

/// Decode a base64 Ed25519 verifying key.
///
/// # Errors
/// Returns `ModelError::Signature` on bad base64, length, or key bytes.
pub fn verifying_key_from_b64(b64: &str) -> Result<VerifyingKey, ModelError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64.trim())
        .map_err(|_| ModelError::Signature("Invalid public key base64".into()))?;
    let key: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| ModelError::Signature("Invalid public key length (expected 32 bytes)".into()))?;
    VerifyingKey::from_bytes(&key)
        .map_err(|_| ModelError::Signature("Invalid verifying key".into()))
}

// Constant-time compare for equal-length ASCII digests.
fn digest_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Standardized logistic regression loaded from disk.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    params: ExportedLogisticModel,
    signed: bool,
}

impl LogisticModel {
    /// Build a model directly from parameters.
    ///
    /// # Errors
    /// Returns `ModelError::Artifact` if the parameters are inconsistent.
    pub fn from_params(params: ExportedLogisticModel) -> Result<Self, ModelError> {
        params.validate()?;
        Ok(Self {
            params,
            signed: false,
        })
    }

    /// Load and verify the model in `model_dir`.
    ///
    /// # Errors
    /// Returns `ModelError::Signature` if trust checks fail, and
    /// `ModelError::Artifact` if the model file is missing or invalid.
    pub fn load(model_dir: &Path, trust: &ModelTrust) -> Result<Self, ModelError> {
        let manifest = Self::verify_manifest(model_dir, trust)?;

        let model_path = model_dir.join(MODEL_FILE);
        let content = fs::read(&model_path).map_err(|e| {
            ModelError::Artifact(format!("Failed to read {}: {e}", model_path.display()))
        })?;

        // The bytes parsed must be the bytes that were hashed.
        if let Some(manifest) = &manifest {
            let expected = manifest.files.get(MODEL_FILE).ok_or_else(|| {
                ModelError::Signature(format!("{MANIFEST_FILE} does not bind {MODEL_FILE}"))
            })?;
            if !digest_eq(&sha256_hex(&content), expected) {
                return Err(ModelError::Signature(format!("File hash mismatch for {MODEL_FILE}")));
            }
        }

        let params: ExportedLogisticModel = serde_json::from_slice(&content)
            .map_err(|e| ModelError::Artifact(format!("Invalid {MODEL_FILE}: {e}")))?;
        params.validate()?;

        tracing::info!(
            "Loaded model {} from {:?} (signed={}, n_features={})",
            params.version,
            model_path,
            manifest.is_some(),
            params.feature_names.len()
        );

        Ok(Self {
            params,
            signed: manifest.is_some(),
        })
    }

    /// Check `manifest.json` and `model.sig`.
    ///
    /// Returns `None` only when unsigned loading is permitted.
    fn verify_manifest(
        model_dir: &Path,
        trust: &ModelTrust,
    ) -> Result<Option<ModelManifest>, ModelError> {
        let sig_path = model_dir.join(SIGNATURE_FILE);
        let manifest_path = model_dir.join(MANIFEST_FILE);
        let signed = sig_path.exists() && manifest_path.exists();

        let key = match (&trust.verifying_key, signed) {
            (Some(key), true) => key,
            _ if trust.unsigned_permitted() => {
                tracing::warn!(
                    "Loading model from {:?} WITHOUT signature verification (debug build, unsigned models allowed)",
                    model_dir
                );
                return Ok(None);
            }
            (None, _) => {
                return Err(ModelError::Signature(
                    "No model verifying key configured".into(),
                ))
            }
            (Some(_), false) => {
                return Err(ModelError::Signature(format!(
                    "Model signature required: {SIGNATURE_FILE} or {MANIFEST_FILE} missing in {}",
                    model_dir.display()
                )))
            }
        };

        let sig_bytes = fs::read(&sig_path)
            .map_err(|e| ModelError::Signature(format!("Failed to read signature: {e}")))?;
        let sig_bytes: [u8; 64] = sig_bytes
            .as_slice()
            .try_into()
            .map_err(|_| ModelError::Signature("Invalid signature length (expected 64 bytes)".into()))?;
        let signature = Signature::from_bytes(&sig_bytes);

        let manifest_content = fs::read(&manifest_path)
            .map_err(|e| ModelError::Signature(format!("Failed to read manifest: {e}")))?;
        key.verify(&manifest_content, &signature)
            .map_err(|_| ModelError::Signature("Invalid model signature".into()))?;

        let manifest: ModelManifest = serde_json::from_slice(&manifest_content)
            .map_err(|e| ModelError::Signature(format!("Invalid {MANIFEST_FILE} format: {e}")))?;
        if manifest.version != MANIFEST_VERSION {
            return Err(ModelError::Signature(format!(
                "Unsupported manifest version: {}",
                manifest.version
            )));
        }
        if !manifest.files.contains_key(MODEL_FILE) {
            return Err(ModelError::Signature(format!(
                "{MANIFEST_FILE} must include {MODEL_FILE}"
            )));
        }

        for (rel, expected_hex) in &manifest.files {
            let path = model_dir.join(rel);
            let bytes = fs::read(&path).map_err(|e| {
                ModelError::Signature(format!(
                    "Manifest references missing/unreadable file {}: {e}",
                    path.display()
                ))
            })?;
            if !digest_eq(&sha256_hex(&bytes), expected_hex) {
                return Err(ModelError::Signature(format!("File hash mismatch for {rel}")));
            }
        }

        tracing::info!("Model signature and hashes verified");
        Ok(Some(manifest))
    }

    /// Whether this model passed signature verification.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    /// Probabilities for class 0 and class 1.
    ///
    /// # Errors
    /// Returns `ModelError::MalformedVector` if any value is missing or non-finite.
    pub fn class_probabilities(&self, features: &FeatureVector) -> Result<[f64; 2], ModelError> {
        let p = &self.params;
        let mut logit = p.intercept;

        for (i, &x) in features.as_slice().iter().enumerate() {
            if !x.is_finite() {
                return Err(ModelError::MalformedVector(format!(
                    "{} is {x}",
                    FEATURE_NAMES[i]
                )));
            }
            logit += p.coefficients[i] * (x - p.scaler_mean[i]) / p.scaler_scale[i];
        }

        let p1 = sigmoid(logit);
        tracing::trace!("logit={logit:.4}, p1={p1:.4}");
        Ok([1.0 - p1, p1])
    }
}

impl RiskModel for LogisticModel {
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        let probabilities = self.class_probabilities(features)?;
        let positive = probabilities[self.params.positive_class_index];
        if !(0.0..=1.0).contains(&positive) {
            return Err(ModelError::InvalidOutput(positive));
        }
        Ok(positive)
    }

    fn version(&self) -> &str {
        &self.params.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};
    use rand::RngCore;
    use tempfile::tempdir;

    fn flat_params(intercept: f64) -> ExportedLogisticModel {
        ExportedLogisticModel {
            version: "test-1".into(),
            feature_names: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
            scaler_mean: vec![0.0; FEATURE_COUNT],
            scaler_scale: vec![1.0; FEATURE_COUNT],
            coefficients: vec![0.0; FEATURE_COUNT],
            intercept,
            positive_class_index: 1,
        }
    }

    fn write_model(dir: &Path, params: &ExportedLogisticModel) -> Vec<u8> {
        let bytes = serde_json::to_vec_pretty(params).expect("serialize model");
        fs::write(dir.join(MODEL_FILE), &bytes).expect("write model");
        bytes
    }

    fn fresh_signing_key() -> SigningKey {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        SigningKey::from_bytes(&seed)
    }

    fn sign_dir(dir: &Path, key: &SigningKey, files: &[(&str, &[u8])]) {
        let manifest = ModelManifest {
            version: MANIFEST_VERSION,
            created_at: Some(1_700_000_000),
            files: files
                .iter()
                .map(|(rel, bytes)| ((*rel).to_string(), sha256_hex(bytes)))
                .collect(),
        };
        let manifest_bytes = serde_json::to_vec(&manifest).expect("serialize manifest");
        fs::write(dir.join(MANIFEST_FILE), &manifest_bytes).expect("write manifest");
        let sig: Signature = key.sign(&manifest_bytes);
        fs::write(dir.join(SIGNATURE_FILE), sig.to_bytes()).expect("write signature");
    }

    fn trust_for(key: &SigningKey) -> ModelTrust {
        ModelTrust {
            verifying_key: Some(key.verifying_key()),
            allow_unsigned: false,
        }
    }

    fn vector() -> FeatureVector {
        FeatureVector::from_array([0.0, 45.0, 0.0, 0.0, 0.0, 26.1, 5.5, 100.0])
    }

    #[test]
    fn test_load_signed_model() {
        let temp = tempdir().expect("tempdir");
        let key = fresh_signing_key();
        let bytes = write_model(temp.path(), &flat_params(0.0));
        sign_dir(temp.path(), &key, &[(MODEL_FILE, bytes.as_slice())]);

        let model = LogisticModel::load(temp.path(), &trust_for(&key)).expect("load signed model");
        assert!(model.is_signed());
        assert_eq!(model.version(), "test-1");
        let p = model.predict_proba(&vector()).expect("predict");
        assert!((p - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_tampered_model_rejected() {
        let temp = tempdir().expect("tempdir");
        let key = fresh_signing_key();
        let bytes = write_model(temp.path(), &flat_params(0.0));
        sign_dir(temp.path(), &key, &[(MODEL_FILE, bytes.as_slice())]);

        write_model(temp.path(), &flat_params(3.0));

        let err = LogisticModel::load(temp.path(), &trust_for(&key)).expect_err("must fail");
        assert!(err.to_string().contains("hash mismatch"));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let temp = tempdir().expect("tempdir");
        let key = fresh_signing_key();
        let bytes = write_model(temp.path(), &flat_params(0.0));
        sign_dir(temp.path(), &key, &[(MODEL_FILE, bytes.as_slice())]);

        let other = fresh_signing_key();
        let err = LogisticModel::load(temp.path(), &trust_for(&other)).expect_err("must fail");
        assert!(matches!(err, ModelError::Signature(_)));
    }

    #[test]
    fn test_manifest_referencing_missing_file_rejected() {
        let temp = tempdir().expect("tempdir");
        let key = fresh_signing_key();
        let bytes = write_model(temp.path(), &flat_params(0.0));
        sign_dir(
            temp.path(),
            &key,
            &[(MODEL_FILE, bytes.as_slice()), ("calibration.json", &b"missing"[..])],
        );

        let err = LogisticModel::load(temp.path(), &trust_for(&key)).expect_err("must fail");
        let msg = err.to_string();
        assert!(msg.contains("missing") || msg.contains("unreadable"));
    }

    #[test]
    fn test_unsigned_model_rejected_without_bypass() {
        let temp = tempdir().expect("tempdir");
        write_model(temp.path(), &flat_params(0.0));

        let key = fresh_signing_key();
        assert!(LogisticModel::load(temp.path(), &trust_for(&key)).is_err());
        assert!(LogisticModel::load(temp.path(), &ModelTrust::default()).is_err());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_unsigned_model_allowed_in_debug() {
        let trust = ModelTrust::default().allowing_unsigned(true);
        let model = LogisticModel::load(Path::new("models"), &trust).expect("Model should load");
        assert!(!model.is_signed());

        let p = model.predict_proba(&vector()).expect("predict");
        assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn test_feature_names_must_match() {
        let mut params = flat_params(0.0);
        params.feature_names.swap(0, 1);
        let err = LogisticModel::from_params(params).expect_err("must fail");
        assert!(matches!(err, ModelError::Artifact(_)));
    }

    #[test]
    fn test_positive_class_index_selects_probability() {
        let mut params = flat_params(2.0);
        let p1 = LogisticModel::from_params(params.clone())
            .expect("valid")
            .predict_proba(&vector())
            .expect("predict");
        assert!((p1 - sigmoid(2.0)).abs() < 1e-12);

        params.positive_class_index = 0;
        let p0 = LogisticModel::from_params(params)
            .expect("valid")
            .predict_proba(&vector())
            .expect("predict");
        assert!((p0 + p1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_standardization() {
        let mut params = flat_params(0.0);
        params.scaler_mean[1] = 40.0;
        params.scaler_scale[1] = 5.0;
        params.coefficients[1] = 1.0;
        let model = LogisticModel::from_params(params).expect("valid");

        // age 45 -> z = 1
        let [_, p1] = model.class_probabilities(&vector()).expect("predict");
        assert!((p1 - sigmoid(1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_missing_value_is_malformed() {
        let model = LogisticModel::from_params(flat_params(0.0)).expect("valid");
        let mut values = [1.0; FEATURE_COUNT];
        values[6] = f64::NAN;
        let err = model
            .predict_proba(&FeatureVector::from_array(values))
            .expect_err("must fail");
        assert!(matches!(err, ModelError::MalformedVector(_)));
    }

    #[test]
    fn test_public_key_b64() {
        let key = fresh_signing_key();
        let b64 = base64::engine::general_purpose::STANDARD.encode(key.verifying_key().to_bytes());
        let trust = ModelTrust::from_public_key_b64(&b64).expect("valid key");
        assert_eq!(trust.verifying_key, Some(key.verifying_key()));

        assert!(ModelTrust::from_public_key_b64("not base64!").is_err());
        assert!(ModelTrust::from_public_key_b64("AAAA").is_err());
    }
}
