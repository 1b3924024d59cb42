//! Ports layer: Trait definitions for external collaborators.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the scoring pipeline and the model runtime and asset store.

mod plan_resolver;
mod risk_model;

pub use plan_resolver::PlanResolver;
pub use risk_model::{ModelError, RiskModel};
