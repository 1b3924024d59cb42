//! Patient record intake: Reads one JSON record into a `PatientInput`.
//!
//! Anything the user typed wrong (bad JSON, a wrong category label, a number
//! outside the field's type) is reported as `InvalidInput`, the same as a
//! range violation caught later by `PatientInput::validate`.

use std::io::Read;

use serde_json::error::Category;

use crate::domain::PatientInput;
use crate::GlycoriskError;

/// Parse a patient record from JSON text.
///
/// # Errors
/// Returns `GlycoriskError::InvalidInput` for malformed or ill-typed records.
pub fn parse_patient(raw: &str) -> Result<PatientInput, GlycoriskError> {
    serde_json::from_str(raw).map_err(|e| match e.classify() {
        Category::Io => GlycoriskError::Serialization(e),
        _ => GlycoriskError::InvalidInput(format!("patient record rejected: {e}")),
    })
}

/// Read a whole record from `reader` and parse it.
///
/// # Errors
/// Returns `GlycoriskError::Io` if reading fails, otherwise as `parse_patient`.
pub fn read_patient(mut reader: impl Read) -> Result<PatientInput, GlycoriskError> {
    let mut raw = String::new();
    reader.read_to_string(&mut raw)?;
    parse_patient(&raw)
}
