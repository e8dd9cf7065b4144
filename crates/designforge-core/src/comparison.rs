//! Comparison Assembler: bundles previously generated designs for
//! side-by-side display. No scoring, no generation.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{CameraAngle, DesignId, LightingSetup, MaterialType};
use crate::metrics::METRICS;
use crate::obs;
use crate::registry::DesignRegistry;

/// Fewest designs a comparison can hold.
pub const MIN_COMPARED: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComparisonError {
    #[error("need at least 2 designs for comparison, got {requested}")]
    TooFewDesigns { requested: usize },

    #[error("unknown design id(s): {}", join_ids(.ids))]
    UnknownDesign { ids: Vec<DesignId> },

    #[error("design {id} has no image to compare")]
    NotRenderable { id: DesignId },
}

fn join_ids(ids: &[DesignId]) -> String {
    ids.iter()
        .map(DesignId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// One design as shown in the comparison view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonEntry {
    pub position: usize,
    pub design_id: DesignId,
    pub image_url: String,
    pub image_path: PathBuf,
    pub camera_angle: CameraAngle,
    pub lighting: LightingSetup,
    pub material: MaterialType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonBundle {
    pub comparison_id: String,
    /// Same order as the requested ids.
    pub entries: Vec<ComparisonEntry>,
}

impl ComparisonBundle {
    pub fn total_compared(&self) -> usize {
        self.entries.len()
    }

    pub fn image_urls(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.image_url.as_str()).collect()
    }

    pub fn design_ids(&self) -> Vec<&DesignId> {
        self.entries.iter().map(|e| &e.design_id).collect()
    }
}

/// Resolve `ids` against `registry` and bundle them in input order.
///
/// # Errors
///
/// - [`ComparisonError::TooFewDesigns`] for fewer than two ids.
/// - [`ComparisonError::UnknownDesign`] naming every id with no prior result.
/// - [`ComparisonError::NotRenderable`] for the first id whose generation failed.
pub fn assemble_comparison(
    registry: &DesignRegistry,
    ids: &[DesignId],
) -> Result<ComparisonBundle, ComparisonError> {
    if ids.len() < MIN_COMPARED {
        return Err(ComparisonError::TooFewDesigns {
            requested: ids.len(),
        });
    }

    let mut found = Vec::with_capacity(ids.len());
    let mut missing = Vec::new();
    for id in ids {
        match registry.get(id) {
            Some(design) => found.push((id, design)),
            None => missing.push(id.clone()),
        }
    }
    if !missing.is_empty() {
        return Err(ComparisonError::UnknownDesign { ids: missing });
    }

    let mut entries = Vec::with_capacity(found.len());
    for (position, (id, design)) in found.into_iter().enumerate() {
        let image = design
            .image_reference
            .as_ref()
            .ok_or_else(|| ComparisonError::NotRenderable { id: id.clone() })?;
        entries.push(ComparisonEntry {
            position,
            design_id: id.clone(),
            image_url: image.url.clone(),
            image_path: image.path.clone(),
            camera_angle: design.parameters.camera_angle(),
            lighting: design.parameters.lighting(),
            material: design.parameters.material(),
        });
    }

    let bundle = ComparisonBundle {
        comparison_id: format!("comparison_{}", Uuid::new_v4().simple()),
        entries,
    };
    METRICS.inc_comparisons();
    obs::emit_comparison_assembled(&bundle.comparison_id, bundle.total_compared());
    Ok(bundle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_few_ids() {
        let registry = DesignRegistry::new();
        let err = assemble_comparison(&registry, &[DesignId::from("a")]).unwrap_err();
        assert_eq!(err, ComparisonError::TooFewDesigns { requested: 1 });
        assert!(err.to_string().contains("at least 2"));
    }

    #[test]
    fn unknown_ids_are_all_named() {
        let registry = DesignRegistry::new();
        let ids = vec![DesignId::from("a"), DesignId::from("b")];
        let err = assemble_comparison(&registry, &ids).unwrap_err();
        assert_eq!(err, ComparisonError::UnknownDesign { ids: ids.clone() });
        assert_eq!(err.to_string(), "unknown design id(s): a, b");
    }
}
