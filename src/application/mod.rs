//! Application layer: Use cases.
//!
//! This module orchestrates domain logic with ports to implement
//! the scoring entry point.

mod intake;
mod scoring;

pub use intake::{parse_patient, read_patient};
pub use scoring::ScoringContext;
