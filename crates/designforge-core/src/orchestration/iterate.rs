//! Iteration planning: fine-grained refinements of one design.
//!
//! Where variants sweep camera angles, iterations keep the framing and step
//! the field of view and reflectivity upward across the run while rotating
//! through four lighting presets. Step `i` of `n` scales by `(i + 1) / n`.

use crate::domain::params::{MAX_FOV, MIN_FOV};
use crate::domain::{DesignParameters, LightingSetup};

use super::perturb::{variant_priority, VariantPlan};

pub const ITERATION_LIGHTING: [LightingSetup; 4] = [
    LightingSetup::Studio,
    LightingSetup::Hdr,
    LightingSetup::Dramatic,
    LightingSetup::Soft,
];

/// FOV multiplier spans `0.9..=1.1`.
const FOV_FLOOR: f64 = 0.9;
const FOV_SPAN: f64 = 0.2;

/// Reflectivity multiplier spans `0.85..=1.15`, clamped into `[0, 1]`.
const REFLECTIVITY_FLOOR: f64 = 0.85;
const REFLECTIVITY_SPAN: f64 = 0.3;

/// Plan iteration `slot` of a run of `count`.
///
/// The stepped FOV is kept inside the range [`DesignParameters::validate`]
/// accepts so a valid base never produces an invalid iteration.
pub fn suggest_iteration(base: &DesignParameters, slot: usize, count: usize) -> VariantPlan {
    let step = (slot + 1) as f64 / count.max(1) as f64;
    let fov = (base.fov() * (FOV_FLOOR + step * FOV_SPAN)).clamp(MIN_FOV, MAX_FOV);
    let reflectivity = base.reflectivity() * (REFLECTIVITY_FLOOR + step * REFLECTIVITY_SPAN);
    let lighting = ITERATION_LIGHTING[slot % ITERATION_LIGHTING.len()];

    let number = slot + 1;
    let variant_id = format!("iteration_{number}");
    VariantPlan {
        slot,
        agent_id: format!("agent_{variant_id}"),
        variant_id,
        priority: variant_priority(base.camera_angle(), lighting),
        variation_type: format!("lighting_{lighting}_fov_{fov:.1}"),
        parameters: base
            .clone()
            .with_fov(fov)
            .with_reflectivity(reflectivity)
            .with_lighting(lighting)
            .with_prompt(format!("{} {} lighting", base.prompt(), lighting)),
    }
}

/// Plans for iterations `1..=count`, in slot order.
pub fn suggest_iterations(base: &DesignParameters, count: usize) -> Vec<VariantPlan> {
    (0..count)
        .map(|slot| suggest_iteration(base, slot, count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CameraAngle, ProductCategory};

    fn base() -> DesignParameters {
        DesignParameters::new("ceramic pour-over kettle", ProductCategory::Appliance)
            .with_camera_angle(CameraAngle::Side)
            .with_fov(50.0)
            .with_reflectivity(0.8)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn four_iterations_step_fov_and_reflectivity() {
        let plans = suggest_iterations(&base(), 4);
        let fovs: Vec<f64> = plans.iter().map(|p| p.parameters.fov()).collect();
        let expected_fov = [47.5, 50.0, 52.5, 55.0];
        for (got, want) in fovs.iter().zip(expected_fov) {
            assert!(close(*got, want), "{got} != {want}");
        }
        assert!(close(plans[0].parameters.reflectivity(), 0.8 * 0.925));
        assert!(close(plans[3].parameters.reflectivity(), 0.8 * 1.15));
    }

    #[test]
    fn lighting_rotates_through_four_presets() {
        let lighting: Vec<LightingSetup> = suggest_iterations(&base(), 6)
            .iter()
            .map(|p| p.parameters.lighting())
            .collect();
        assert_eq!(
            lighting,
            vec![
                LightingSetup::Studio,
                LightingSetup::Hdr,
                LightingSetup::Dramatic,
                LightingSetup::Soft,
                LightingSetup::Studio,
                LightingSetup::Hdr,
            ]
        );
    }

    #[test]
    fn camera_and_material_are_kept() {
        for plan in suggest_iterations(&base(), 3) {
            assert_eq!(plan.parameters.camera_angle(), CameraAngle::Side);
            assert_eq!(plan.parameters.material(), base().material());
        }
    }

    #[test]
    fn reflectivity_stays_in_unit_interval() {
        let shiny = base().with_reflectivity(1.0);
        let last = suggest_iteration(&shiny, 3, 4);
        assert_eq!(last.parameters.reflectivity(), 1.0);
    }

    #[test]
    fn stepped_fov_stays_valid() {
        let wide = base().with_fov(MAX_FOV);
        for plan in suggest_iterations(&wide, 4) {
            assert!(plan.parameters.validate().is_ok(), "{}", plan.variation_type);
        }
    }

    #[test]
    fn ids_and_labels_are_one_based() {
        let plan = suggest_iteration(&base(), 1, 4);
        assert_eq!(plan.slot, 1);
        assert_eq!(plan.variant_id, "iteration_2");
        assert_eq!(plan.agent_id, "agent_iteration_2");
        assert_eq!(plan.variation_type, "lighting_hdr_fov_50.0");
        assert_eq!(plan.parameters.prompt(), "ceramic pour-over kettle hdr lighting");
    }
}
