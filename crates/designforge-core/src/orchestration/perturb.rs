//! Deterministic variant suggestion.
//!
//! Slot `i` always yields the same perturbation of a given base, so runs are
//! reproducible. The first six slots walk three camera angles against two
//! lighting presets; later slots continue the rotation with isometric shots.

use std::fmt;

use serde::Serialize;

use crate::domain::{CameraAngle, DesignParameters, LightingSetup};
use crate::generation::ImageKind;

use super::iterate::suggest_iterations;

/// How a run derives its per-slot parameters from the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PerturbStrategy {
    /// Camera, lighting and palette sweeps of the base design.
    #[default]
    Variants,
    /// Small FOV and reflectivity steps with rotating lighting.
    Iterations,
}

impl PerturbStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            PerturbStrategy::Variants => "variants",
            PerturbStrategy::Iterations => "iterations",
        }
    }

    /// Plans for slots `0..count` under this strategy.
    pub fn plans(self, base: &DesignParameters, count: usize) -> Vec<VariantPlan> {
        match self {
            PerturbStrategy::Variants => suggest_variants(base, count),
            PerturbStrategy::Iterations => suggest_iterations(base, count),
        }
    }

    /// File family the generated images are stored under.
    pub fn image_kind(self) -> ImageKind {
        match self {
            PerturbStrategy::Variants => ImageKind::Variant,
            PerturbStrategy::Iterations => ImageKind::Iteration,
        }
    }
}

impl fmt::Display for PerturbStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const CAMERA_ROTATION: [CameraAngle; 4] = [
    CameraAngle::ThreeQuarter,
    CameraAngle::Side,
    CameraAngle::Front,
    CameraAngle::Isometric,
];

pub const LIGHTING_ROTATION: [LightingSetup; 2] = [LightingSetup::Studio, LightingSetup::Dramatic];

/// Alternate palettes for slots whose index is not a multiple of four.
/// Slot `4k` keeps the base palette.
pub const PALETTE_VARIATIONS: [[&str; 3]; 3] = [
    ["#2a2a2a", "#f0f0f0", "#d0d0d0"],
    ["#0a0a0a", "#ffffff", "#b0b0b0"],
    ["#3a3a3a", "#fafafa", "#e0e0e0"],
];

/// A suggested variant for one slot, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantPlan {
    pub slot: usize,
    pub variant_id: String,
    /// Identifier of the agent that issued this variant.
    pub agent_id: String,
    /// 1..=10, higher means the combination is usually preferred.
    pub priority: u8,
    /// Short label for what this slot changed, e.g. `side_dramatic`.
    pub variation_type: String,
    pub parameters: DesignParameters,
}

/// Priority heuristic for a camera/lighting pair, capped at 10.
pub fn variant_priority(camera: CameraAngle, lighting: LightingSetup) -> u8 {
    let mut priority: u8 = 5;
    priority += match camera {
        CameraAngle::ThreeQuarter => 3,
        CameraAngle::Isometric => 2,
        _ => 0,
    };
    priority += match lighting {
        LightingSetup::Studio => 2,
        LightingSetup::Hdr => 3,
        _ => 0,
    };
    priority.min(10)
}

/// Perturb `base` for `slot`.
pub fn suggest_variant(base: &DesignParameters, slot: usize) -> VariantPlan {
    let camera = CAMERA_ROTATION[(slot / LIGHTING_ROTATION.len()) % CAMERA_ROTATION.len()];
    let lighting = LIGHTING_ROTATION[slot % LIGHTING_ROTATION.len()];

    let palette: Vec<String> = match slot % (PALETTE_VARIATIONS.len() + 1) {
        0 => base.color_palette().to_vec(),
        n => PALETTE_VARIATIONS[n - 1].iter().map(|c| c.to_string()).collect(),
    };

    let mut prompt = format!("{} {} view {} lighting", base.prompt(), camera, lighting);
    if !palette.is_empty() {
        prompt.push_str(" with colors ");
        prompt.push_str(&palette.join(", "));
    }

    let variant_id = format!("variant_{slot}");
    VariantPlan {
        slot,
        agent_id: format!("agent_{variant_id}"),
        variant_id,
        priority: variant_priority(camera, lighting),
        variation_type: format!("{camera}_{lighting}"),
        parameters: base
            .clone()
            .with_camera_angle(camera)
            .with_lighting(lighting)
            .with_color_palette(palette)
            .with_prompt(prompt),
    }
}

/// Plans for slots `0..count`, in slot order.
pub fn suggest_variants(base: &DesignParameters, count: usize) -> Vec<VariantPlan> {
    (0..count).map(|slot| suggest_variant(base, slot)).collect()
}
