//! Domain types: parameters, results and the error taxonomy.

pub mod error;
pub mod params;
pub mod result;

pub use error::{DesignError, FailureKind, ProviderError};
pub use params::{
    CameraAngle, DesignParameters, LightingSetup, MaterialType, ProductCategory, ProviderKind,
};
pub use result::{DesignId, DesignResult, GenerationFailure, ImageReference};
