//! Fixed-order feature vector for the diabetes classifier.
//!
//! Column order: gender, age, hypertension, heart_disease, smoking, bmi, hba1c, glucose.
//! NaN marks a missing value until the vector has been imputed.

use serde::{Deserialize, Serialize};

use super::patient::PatientInput;

/// Number of model input columns.
pub const FEATURE_COUNT: usize = 8;

/// Column names in model order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "gender",
    "age",
    "hypertension",
    "heart_disease",
    "smoking_history",
    "bmi",
    "HbA1c_level",
    "blood_glucose_level",
];

/// A model input column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureColumn {
    Gender,
    Age,
    Hypertension,
    HeartDisease,
    Smoking,
    Bmi,
    Hba1c,
    Glucose,
}

impl FeatureColumn {
    pub const ALL: [Self; FEATURE_COUNT] = [
        Self::Gender,
        Self::Age,
        Self::Hypertension,
        Self::HeartDisease,
        Self::Smoking,
        Self::Bmi,
        Self::Hba1c,
        Self::Glucose,
    ];

    /// Clinical measurements, as opposed to demographic or history codes.
    pub const MEASUREMENTS: [Self; 3] = [Self::Bmi, Self::Hba1c, Self::Glucose];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        FEATURE_NAMES[self.index()]
    }
}

/// How a lab value of exactly zero is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabZeroPolicy {
    /// Zero means the field was left blank; it becomes missing.
    #[default]
    NotProvided,
    /// Zero is a real reading and is passed through.
    Reading,
}

impl LabZeroPolicy {
    /// Apply the policy to an optional lab reading.
    ///
    /// Returns `None` for values that count as missing.
    #[must_use]
    pub fn resolve(self, value: Option<f64>) -> Option<f64> {
        match (self, value) {
            (_, None) => None,
            (_, Some(v)) if v.is_nan() => None,
            (Self::NotProvided, Some(v)) if v == 0.0 => None,
            (_, Some(v)) => Some(v),
        }
    }
}

impl std::str::FromStr for LabZeroPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "not-provided" | "missing" => Ok(Self::NotProvided),
            "reading" | "zero" => Ok(Self::Reading),
            other => Err(format!(
                "unknown lab zero policy '{other}' (expected not-provided or reading)"
            )),
        }
    }
}

/// Model input row, possibly holding NaN for missing values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Encode a patient into model order.
    #[must_use]
    pub fn from_patient(patient: &PatientInput, lab_zero: LabZeroPolicy) -> Self {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };

        Self([
            patient.gender.code(),
            f64::from(patient.age),
            flag(patient.hypertension),
            flag(patient.heart_disease),
            patient.smoking_history.code(),
            patient.bmi().unwrap_or(f64::NAN),
            lab_zero.resolve(patient.hba1c).unwrap_or(f64::NAN),
            lab_zero.resolve(patient.blood_glucose).unwrap_or(f64::NAN),
        ])
    }

    #[must_use]
    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn get(&self, column: FeatureColumn) -> f64 {
        self.0[column.index()]
    }

    /// Columns currently holding NaN.
    #[must_use]
    pub fn missing_columns(&self) -> Vec<FeatureColumn> {
        FeatureColumn::ALL
            .into_iter()
            .filter(|c| self.get(*c).is_nan())
            .collect()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.0.iter().all(|v| !v.is_nan())
    }

    /// Replace every NaN with the mean of the row's present values.
    ///
    /// Returns `None` when no value is present, since the mean is then undefined.
    #[must_use]
    pub fn impute_row_mean(&self) -> Option<ImputedVector> {
        let present: Vec<f64> = self.0.iter().copied().filter(|v| !v.is_nan()).collect();
        if present.is_empty() {
            return None;
        }

        let fill_value = present.iter().sum::<f64>() / present.len() as f64;
        let imputed = self.missing_columns();

        let mut values = self.0;
        for v in &mut values {
            if v.is_nan() {
                *v = fill_value;
            }
        }

        Some(ImputedVector {
            vector: Self(values),
            imputed,
            fill_value,
        })
    }
}

/// A fully numeric row plus a record of what was filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct ImputedVector {
    pub vector: FeatureVector,
    pub imputed: Vec<FeatureColumn>,
    pub fill_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::patient::tests::sample_patient;

    #[test]
    fn test_encoding_order() {
        let v = FeatureVector::from_patient(&sample_patient(), LabZeroPolicy::NotProvided);
        let s = v.as_slice();
        assert_eq!(s.len(), FEATURE_COUNT);
        assert_eq!(s[0], 0.0);
        assert_eq!(s[1], 45.0);
        assert_eq!(s[2], 0.0);
        assert_eq!(s[3], 0.0);
        assert_eq!(s[4], 0.0);
        assert!((s[5] - 26.1224).abs() < 1e-3);
        assert_eq!(s[6], 7.2);
        assert_eq!(s[7], 160.0);
    }

    #[test]
    fn test_zero_labs_follow_policy() {
        let patient = PatientInput {
            hba1c: Some(0.0),
            blood_glucose: Some(0.0),
            ..sample_patient()
        };

        let blank = FeatureVector::from_patient(&patient, LabZeroPolicy::NotProvided);
        assert_eq!(
            blank.missing_columns(),
            vec![FeatureColumn::Hba1c, FeatureColumn::Glucose]
        );

        let reading = FeatureVector::from_patient(&patient, LabZeroPolicy::Reading);
        assert!(reading.is_complete());
        assert_eq!(reading.get(FeatureColumn::Hba1c), 0.0);
    }

    #[test]
    fn test_missing_height_gives_nan_bmi() {
        let patient = PatientInput {
            height_cm: 0.0,
            ..sample_patient()
        };
        let v = FeatureVector::from_patient(&patient, LabZeroPolicy::NotProvided);
        assert!(v.get(FeatureColumn::Bmi).is_nan());
    }

    #[test]
    fn test_impute_fills_with_row_mean() {
        let v = FeatureVector::from_array([1.0, 50.0, 0.0, 1.0, f64::NAN, 28.0, f64::NAN, 120.0]);
        let out = v.impute_row_mean().expect("Should impute");

        let expected = (1.0 + 50.0 + 0.0 + 1.0 + 28.0 + 120.0) / 6.0;
        assert!((out.fill_value - expected).abs() < 1e-12);
        assert!(out.vector.is_complete());
        assert_eq!(out.vector.get(FeatureColumn::Smoking), out.fill_value);
        assert_eq!(out.vector.get(FeatureColumn::Hba1c), out.fill_value);
        assert_eq!(out.vector.get(FeatureColumn::Age), 50.0);
        assert_eq!(
            out.imputed,
            vec![FeatureColumn::Smoking, FeatureColumn::Hba1c]
        );
    }

    #[test]
    fn test_impute_complete_row_is_unchanged() {
        let v = FeatureVector::from_patient(&sample_patient(), LabZeroPolicy::NotProvided);
        let out = v.impute_row_mean().expect("Should impute");
        assert_eq!(out.vector, v);
        assert!(out.imputed.is_empty());
    }

    #[test]
    fn test_impute_all_missing_is_degenerate() {
        let v = FeatureVector::from_array([f64::NAN; FEATURE_COUNT]);
        assert!(v.impute_row_mean().is_none());
    }

    #[test]
    fn test_lab_zero_policy_parse() {
        assert_eq!("reading".parse::<LabZeroPolicy>(), Ok(LabZeroPolicy::Reading));
        assert_eq!(
            " Not-Provided ".parse::<LabZeroPolicy>(),
            Ok(LabZeroPolicy::NotProvided)
        );
        assert!("sometimes".parse::<LabZeroPolicy>().is_err());
    }
}
