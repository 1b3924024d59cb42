//! Risk model port: Trait for the pre-trained diabetes classifier.
//!
//! This trait abstracts the model runtime from the scoring pipeline.

use crate::domain::FeatureVector;

/// Errors that can occur while loading or querying a risk model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Malformed feature vector: {0}")]
    MalformedVector(String),

    #[error("Model produced an invalid probability: {0}")]
    InvalidOutput(f64),

    #[error("Invalid model artifact: {0}")]
    Artifact(String),

    #[error("Model signature check failed: {0}")]
    Signature(String),
}

/// Trait for diabetes probability estimation.
///
/// Implementations must be deterministic for a fixed vector and model version.
pub trait RiskModel: Send + Sync {
    /// Probability that the subject is diabetic.
    ///
    /// # Arguments
    /// * `features` - Fully imputed feature vector in model column order
    ///
    /// # Returns
    /// The positive-class probability in [0, 1].
    ///
    /// # Errors
    /// Returns `ModelError` if the vector is malformed or the model fails.
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, ModelError>;

    /// Identifier of the loaded model version, for logging.
    fn version(&self) -> &str;
}
