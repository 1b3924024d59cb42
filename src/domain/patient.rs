//! Patient-reported inputs for diabetes risk scoring.
//!
//! One `PatientInput` is captured per submission and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// Biological sex as collected by the entry form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Model encoding: Male = 0, Female = 1.
    #[must_use]
    pub fn code(self) -> f64 {
        match self {
            Self::Male => 0.0,
            Self::Female => 1.0,
        }
    }
}

/// Smoking history categories, labelled exactly as the training data labels them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmokingHistory {
    #[serde(rename = "never")]
    Never,
    #[serde(rename = "No Info")]
    NoInfo,
    #[serde(rename = "former")]
    Former,
    #[serde(rename = "current")]
    Current,
    #[serde(rename = "ever")]
    Ever,
    #[serde(rename = "not current")]
    NotCurrent,
}

impl SmokingHistory {
    /// All categories in encoding order.
    pub const ALL: [Self; 6] = [
        Self::Never,
        Self::NoInfo,
        Self::Former,
        Self::Current,
        Self::Ever,
        Self::NotCurrent,
    ];

    /// Model encoding. Must match the encoder the classifier was trained with.
    #[must_use]
    pub fn code(self) -> f64 {
        match self {
            Self::Never => 0.0,
            Self::NoInfo => 1.0,
            Self::Former => 2.0,
            Self::Current => 3.0,
            Self::Ever => 4.0,
            Self::NotCurrent => 5.0,
        }
    }

    /// Form label for this category.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::NoInfo => "No Info",
            Self::Former => "former",
            Self::Current => "current",
            Self::Ever => "ever",
            Self::NotCurrent => "not current",
        }
    }
}

/// Raw health metrics for one scoring pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientInput {
    pub gender: Gender,

    /// Age in whole years (0-120)
    pub age: u8,

    /// Doctor-diagnosed hypertension
    pub hypertension: bool,

    /// Doctor-diagnosed heart disease
    pub heart_disease: bool,

    pub smoking_history: SmokingHistory,

    /// Height in cm (0 means not provided)
    pub height_cm: f64,

    /// Weight in kg
    pub weight_kg: f64,

    /// Glycohemoglobin HbA1c in %
    #[serde(default)]
    pub hba1c: Option<f64>,

    /// Blood glucose in mg/dL
    #[serde(default)]
    pub blood_glucose: Option<f64>,
}

/// Accepted ranges for the numeric form fields.
pub const AGE_RANGE: std::ops::RangeInclusive<u8> = 0..=120;
pub const HEIGHT_RANGE_CM: std::ops::RangeInclusive<f64> = 0.0..=250.0;
pub const WEIGHT_RANGE_KG: std::ops::RangeInclusive<f64> = 0.0..=200.0;
pub const HBA1C_RANGE: std::ops::RangeInclusive<f64> = 0.0..=15.0;
pub const GLUCOSE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=500.0;

impl PatientInput {
    /// Body mass index, or `None` when height is not positive.
    #[must_use]
    pub fn bmi(&self) -> Option<f64> {
        if self.height_cm > 0.0 {
            let height_m = self.height_cm / 100.0;
            Some(self.weight_kg / (height_m * height_m))
        } else {
            None
        }
    }

    /// Check every field against the form ranges.
    ///
    /// # Errors
    /// Returns all violations, not just the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !AGE_RANGE.contains(&self.age) {
            errors.push(format!("Age {} out of range [0, 120]", self.age));
        }
        if !self.height_cm.is_finite() || !HEIGHT_RANGE_CM.contains(&self.height_cm) {
            errors.push(format!(
                "Height {} cm out of range [0, 250]",
                self.height_cm
            ));
        }
        if !self.weight_kg.is_finite() || !WEIGHT_RANGE_KG.contains(&self.weight_kg) {
            errors.push(format!(
                "Weight {} kg out of range [0, 200]",
                self.weight_kg
            ));
        }
        if let Some(hba1c) = self.hba1c {
            if !hba1c.is_finite() || !HBA1C_RANGE.contains(&hba1c) {
                errors.push(format!("HbA1c {hba1c}% out of range [0, 15]"));
            }
        }
        if let Some(glucose) = self.blood_glucose {
            if !glucose.is_finite() || !GLUCOSE_RANGE.contains(&glucose) {
                errors.push(format!(
                    "Blood glucose {glucose} mg/dL out of range [0, 500]"
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
