//! Storyboard planning.
//!
//! Turns an ordered list of frames into shot directions: camera, lighting,
//! composition, transition and duration per frame, plus a summary of the
//! sequence. The opening frame is an establishing shot and the closing frame
//! a hero shot; frames in between progress through camera angles and
//! lighting presets by their relative position. Planning only, nothing is
//! rendered here.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::instrument;

use crate::domain::{CameraAngle, LightingSetup};
use crate::intake::merge_json;

/// Seconds on screen for the opening and closing frames.
pub const BOOKEND_DURATION_SECS: f64 = 3.0;
/// Seconds on screen for every other frame.
pub const DETAIL_DURATION_SECS: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeRole {
    EstablishingShot,
    DetailShot,
    HeroShot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    FadeIn,
    Cut,
    CrossDissolve,
    FadeOut,
}

/// One frame as submitted: loosely structured parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryboardFrame {
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FramePlan {
    /// 1-based position in the sequence.
    pub frame_number: usize,
    pub camera_angle: CameraAngle,
    pub lighting: LightingSetup,
    pub composition_focus: &'static str,
    pub narrative_role: NarrativeRole,
    pub transition: Transition,
    pub duration_secs: f64,
    pub notes: String,
    pub original_params: Value,
    /// `original_params` with the shot direction merged over it.
    pub translated_params: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentKind {
    DramaticEmphasis,
    DirectEngagement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyMoment {
    pub frame: usize,
    #[serde(rename = "type")]
    pub kind: MomentKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrativeStructure {
    pub pacing: &'static str,
    pub visual_progression: &'static str,
    /// Frame number of the closing shot; `None` for an empty storyboard.
    pub climax_frame: Option<usize>,
    pub key_moments: Vec<KeyMoment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryboardPlan {
    pub frames: Vec<FramePlan>,
    pub total_frames: usize,
    pub estimated_duration_secs: f64,
    pub narrative_structure: NarrativeStructure,
}

/// Camera for a middle frame at relative `position` in `[0, 1]`.
pub fn progressive_camera_angle(position: f64) -> CameraAngle {
    if position < 0.33 {
        CameraAngle::Side
    } else if position < 0.66 {
        CameraAngle::ThreeQuarter
    } else {
        CameraAngle::Isometric
    }
}

/// Lighting for a middle frame at relative `position` in `[0, 1]`.
pub fn progressive_lighting(position: f64) -> LightingSetup {
    if position < 0.25 {
        LightingSetup::Soft
    } else if position < 0.5 {
        LightingSetup::Studio
    } else if position < 0.75 {
        LightingSetup::Hdr
    } else {
        LightingSetup::Dramatic
    }
}

fn transition(index: usize, total: usize) -> Transition {
    if index == 0 {
        Transition::FadeIn
    } else if index + 1 == total {
        Transition::FadeOut
    } else if index % 3 == 0 {
        Transition::CrossDissolve
    } else {
        Transition::Cut
    }
}

fn frame_notes(role: NarrativeRole, camera: CameraAngle, lighting: LightingSetup) -> String {
    let opening = match role {
        NarrativeRole::EstablishingShot => "Opens sequence with contextual overview",
        NarrativeRole::HeroShot => "Concludes with impactful final composition",
        NarrativeRole::DetailShot => "Provides detailed product perspective",
    };
    format!(
        "{opening}. Lighting progression to {lighting} maintains visual flow. \
         Camera angle {camera} reveals key product features"
    )
}

fn plan_frame(index: usize, total: usize, frame: &StoryboardFrame) -> FramePlan {
    let (camera, lighting, composition, role) = if index == 0 {
        (
            CameraAngle::ThreeQuarter,
            LightingSetup::Soft,
            "centered",
            NarrativeRole::EstablishingShot,
        )
    } else if index + 1 == total {
        (
            CameraAngle::Front,
            LightingSetup::Dramatic,
            "centered",
            NarrativeRole::HeroShot,
        )
    } else {
        let position = index as f64 / (total - 1) as f64;
        (
            progressive_camera_angle(position),
            progressive_lighting(position),
            "dynamic",
            NarrativeRole::DetailShot,
        )
    };

    let mut translated = frame.params.clone();
    merge_json(
        &mut translated,
        json!({
            "camera_angle": camera,
            "lighting": lighting,
            "composition_focus": composition,
            "narrative_role": role,
        }),
    );

    FramePlan {
        frame_number: index + 1,
        camera_angle: camera,
        lighting,
        composition_focus: composition,
        narrative_role: role,
        transition: transition(index, total),
        duration_secs: if index == 0 || index + 1 == total {
            BOOKEND_DURATION_SECS
        } else {
            DETAIL_DURATION_SECS
        },
        notes: frame_notes(role, camera, lighting),
        original_params: frame.params.clone(),
        translated_params: translated,
    }
}

fn narrative_structure(frames: &[FramePlan]) -> NarrativeStructure {
    let mut key_moments = Vec::new();
    for frame in frames {
        if frame.lighting == LightingSetup::Dramatic {
            key_moments.push(KeyMoment {
                frame: frame.frame_number,
                kind: MomentKind::DramaticEmphasis,
            });
        }
        if frame.camera_angle == CameraAngle::Front {
            key_moments.push(KeyMoment {
                frame: frame.frame_number,
                kind: MomentKind::DirectEngagement,
            });
        }
    }
    NarrativeStructure {
        pacing: "steady",
        visual_progression: "linear",
        climax_frame: frames.last().map(|f| f.frame_number),
        key_moments,
    }
}

/// Plan shot directions for `frames`, in order.
#[instrument(skip_all, fields(frames = frames.len()))]
pub fn translate_storyboard(frames: &[StoryboardFrame]) -> StoryboardPlan {
    let total = frames.len();
    let plans: Vec<FramePlan> = frames
        .iter()
        .enumerate()
        .map(|(index, frame)| plan_frame(index, total, frame))
        .collect();

    StoryboardPlan {
        total_frames: total,
        estimated_duration_secs: plans.iter().map(|f| f.duration_secs).sum(),
        narrative_structure: narrative_structure(&plans),
        frames: plans,
    }
}
