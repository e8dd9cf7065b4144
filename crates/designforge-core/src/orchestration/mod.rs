//! Variant Orchestrator.
//!
//! - [`perturb`]: deterministic per-slot parameter suggestions
//! - [`iterate`]: refinement steps of a single design
//! - [`orchestrator`]: bounded concurrent fan-out and slot-ordered merge
//! - [`report`]: consistency score and recommendations
//! - [`error`]: run-level failures

pub mod error;
pub mod iterate;
pub mod orchestrator;
pub mod perturb;
pub mod report;

pub use error::OrchestrationError;
pub use orchestrator::{OrchestratorConfig, Variant, VariantOrchestrator, VariantRun, VariantSet};
pub use iterate::{suggest_iteration, suggest_iterations};
pub use perturb::{
    suggest_variant, suggest_variants, variant_priority, PerturbStrategy, VariantPlan,
};
pub use report::{ConsistencyPolicy, ConsistencyReport};
