//! Scoring context: Orchestrates one diabetes risk scoring pass.
//!
//! The context is built once at startup and then only borrowed:
//! - Validate the patient input
//! - Encode the feature vector and impute missing values
//! - Query the risk model
//! - Apply clinical threshold overrides and tiering
//! - Attach the tier's lifestyle plan

use std::sync::Arc;

use crate::adapters::{LogisticModel, PlanLibrary};
use crate::config::AppConfig;
use crate::domain::{
    FeatureColumn, FeatureVector, LabZeroPolicy, PatientInput, PlanAsset, RiskTier, RulePolicy,
    ScoreResult,
};
use crate::ports::{ModelError, PlanResolver, RiskModel};
use crate::GlycoriskError;

/// Loaded model, plans and policies for the lifetime of the process.
///
/// Scoring never mutates the context, so it can be shared read-only.
pub struct ScoringContext<M = LogisticModel, P = PlanLibrary>
where
    M: RiskModel,
    P: PlanResolver,
{
    model: Arc<M>,
    plans: P,
    rule_policy: RulePolicy,
    lab_zero: LabZeroPolicy,
}

impl ScoringContext<LogisticModel, PlanLibrary> {
    /// Load the model and plan assets described by `config`.
    ///
    /// Missing plan images only degrade results; a model that cannot be
    /// loaded or verified is fatal.
    ///
    /// # Errors
    /// Returns `GlycoriskError::Startup` if the model cannot be loaded.
    pub fn initialize(config: &AppConfig) -> Result<Self, GlycoriskError> {
        tracing::info!("Initializing scoring context...");

        let model = LogisticModel::load(&config.model_dir, &config.trust).map_err(|e| {
            GlycoriskError::Startup(format!(
                "cannot load model from {}: {e}",
                config.model_dir.display()
            ))
        })?;
        let plans = PlanLibrary::load(&config.plan_dir);

        let missing = plans.missing();
        if !missing.is_empty() {
            tracing::warn!(
                "{} plan image(s) unavailable; results for {:?} will carry no plan",
                missing.len(),
                missing
            );
        }

        tracing::info!(
            "Scoring context ready (model={}, rule_policy={:?}, lab_zero={:?})",
            model.version(),
            config.rule_policy,
            config.lab_zero
        );

        Ok(Self::new(
            Arc::new(model),
            plans,
            config.rule_policy,
            config.lab_zero,
        ))
    }
}

impl<M, P> ScoringContext<M, P>
where
    M: RiskModel,
    P: PlanResolver,
{
    /// Create a context from already-loaded collaborators.
    pub fn new(model: Arc<M>, plans: P, rule_policy: RulePolicy, lab_zero: LabZeroPolicy) -> Self {
        Self {
            model,
            plans,
            rule_policy,
            lab_zero,
        }
    }

    #[must_use]
    pub fn rule_policy(&self) -> &RulePolicy {
        &self.rule_policy
    }

    #[must_use]
    pub fn model_version(&self) -> &str {
        self.model.version()
    }

    /// Plan asset (with image bytes) for a tier, for the presentation layer.
    #[must_use]
    pub fn plan_asset(&self, tier: RiskTier) -> Option<&PlanAsset> {
        self.plans.resolve(tier)
    }

    /// Run one scoring pass.
    ///
    /// # Errors
    /// Returns `GlycoriskError::InvalidInput` for out-of-range values or when
    /// no clinical measurement was provided, and `GlycoriskError::Inference`
    /// if the model fails. No partial result is returned.
    pub fn score(&self, patient: &PatientInput) -> Result<ScoreResult, GlycoriskError> {
        patient
            .validate()
            .map_err(|errors| GlycoriskError::InvalidInput(errors.join("; ")))?;

        tracing::debug!("Step 1: Encoding features...");
        let features = FeatureVector::from_patient(patient, self.lab_zero);

        let missing = features.missing_columns();
        if FeatureColumn::MEASUREMENTS
            .iter()
            .all(|c| missing.contains(c))
        {
            return Err(GlycoriskError::InvalidInput(
                "no clinical measurement provided: enter height and weight, HbA1c, or blood glucose"
                    .to_string(),
            ));
        }

        tracing::debug!("Step 2: Imputing {} missing value(s)...", missing.len());
        let imputed = features.impute_row_mean().ok_or_else(|| {
            GlycoriskError::InvalidInput("every feature is missing".to_string())
        })?;
        if !imputed.vector.is_complete() {
            return Err(GlycoriskError::InvalidInput(
                "imputation left undefined values".to_string(),
            ));
        }

        tracing::debug!("Step 3: Running model {}...", self.model.version());
        let probability = self.model.predict_proba(&imputed.vector)?;
        if !(0.0..=1.0).contains(&probability) {
            return Err(GlycoriskError::Inference(ModelError::InvalidOutput(
                probability,
            )));
        }
        let model_probability = probability * 100.0;

        tracing::debug!("Step 4: Applying clinical rules...");
        let decision = self.rule_policy.evaluate(
            model_probability,
            self.lab_zero.resolve(patient.hba1c),
            self.lab_zero.resolve(patient.blood_glucose),
        );

        let plan = self.plans.resolve(decision.tier).map(PlanAsset::reference);
        if plan.is_none() {
            tracing::warn!("Lifestyle plan image not found for {}", decision.tier);
        }

        tracing::info!(
            "Scoring complete: tier={}, probability={:.2}%, decided_by={:?}, imputed={}",
            decision.tier,
            decision.probability,
            decision.source,
            imputed.imputed.len()
        );

        Ok(ScoreResult {
            probability: decision.probability,
            model_probability,
            tier: decision.tier,
            decided_by: decision.source,
            bmi: patient.bmi(),
            imputed: imputed.imputed,
            plan,
            assessed_at: chrono::Utc::now(),
        })
    }
}
