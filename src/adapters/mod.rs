//! Adapters layer: Concrete implementations of ports.
//!
//! - `logistic`: signed logistic-regression artifact as the risk model
//! - `plan_assets`: lifestyle plan images loaded from disk
//! - `sanitize`: log redaction for patient measurements

pub mod logistic;
pub mod plan_assets;
pub mod sanitize;

pub use logistic::{LogisticModel, ModelTrust};
pub use plan_assets::PlanLibrary;
