//! # Glycorisk
//!
//! Diabetes risk scoring from patient-reported health metrics.
//!
//! This crate provides:
//! - Fixed-order feature encoding with row-mean imputation
//! - Inference through a signed, pre-trained logistic model
//! - Clinical threshold overrides on HbA1c and blood glucose
//! - Risk tiering with a lifestyle plan per tier
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core scoring types and rules (PatientInput, FeatureVector, RiskTier)
//! - `ports`: Trait definitions for the model and plan store
//! - `adapters`: Concrete implementations (logistic model, plan files, log redaction)
//! - `application`: The scoring context orchestrating domain and ports
//! - `config`: Environment-driven startup settings

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::ScoringContext;
pub use domain::{PatientInput, RiskTier, ScoreResult};

/// Result type for Glycorisk operations
pub type Result<T> = std::result::Result<T, GlycoriskError>;

/// Main error type for Glycorisk
#[derive(Debug, thiserror::Error)]
pub enum GlycoriskError {
    #[error("Startup failed: {0}")]
    Startup(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid patient data: {0}")]
    InvalidInput(String),

    #[error("Prediction failed: {0}")]
    Inference(#[from] ports::ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GlycoriskError {
    /// Whether the user can fix this by correcting their input.
    #[must_use]
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}
