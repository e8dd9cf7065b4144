//! DesignForge Core Library
//!
//! Design parameters, the generation seam, variant and iteration
//! orchestration, selection scoring, comparison assembly and storyboard
//! planning. HTTP providers and the server live in sibling crates.

pub mod comparison;
pub mod domain;
pub mod fakes;
pub mod generation;
pub mod intake;
pub mod manufacturability;
pub mod metrics;
pub mod obs;
pub mod orchestration;
pub mod registry;
pub mod selection;
pub mod storyboard;
pub mod telemetry;

pub use comparison::{assemble_comparison, ComparisonBundle, ComparisonEntry, ComparisonError};

pub use domain::{
    CameraAngle, DesignError, DesignId, DesignParameters, DesignResult, FailureKind,
    GenerationFailure, ImageReference, LightingSetup, MaterialType, ProductCategory, ProviderError,
    ProviderKind,
};

pub use generation::{
    FsImageStore, GeneratedImage, GenerationClient, ImageGenerator, ImageKind, ImageStore,
    StoreError,
};

pub use intake::{apply_updates, infer_parameters, merge_json, resolve_request};
pub use manufacturability::{analyze as analyze_manufacturability, CostTier, ManufacturabilityReport};

pub use orchestration::{
    ConsistencyPolicy, ConsistencyReport, OrchestrationError, OrchestratorConfig, PerturbStrategy,
    Variant, VariantOrchestrator, VariantPlan, VariantRun, VariantSet,
};

pub use registry::{DesignRegistry, DEFAULT_REGISTRY_CAPACITY};

pub use selection::{
    improvement_suggestions, score_parameters, select_best, FovBand, ScoreBreakdown, ScoreEntry,
    ScoreWeights, ScoringRubric, Selection, SelectionError,
};

pub use storyboard::{translate_storyboard, StoryboardFrame, StoryboardPlan};

pub use telemetry::{init_tracing, LogFormat};

/// Crate version reported by the health endpoint.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
