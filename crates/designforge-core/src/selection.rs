//! Selection Scorer.
//!
//! A pure function over [`DesignParameters`]: each successful candidate is
//! scored against a [`ScoringRubric`] and the highest score wins. Ties go
//! to the candidate seen first. Failed candidates are skipped, not scored.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::domain::{CameraAngle, DesignId, DesignParameters, DesignResult, LightingSetup};
use crate::metrics::METRICS;
use crate::obs;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no successful designs to select from ({total} candidates, all failed or none given)")]
    NoCandidates { total: usize },
}

/// Points available to each sub-score. Defaults sum to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub camera: f64,
    pub lighting: f64,
    pub composition: f64,
    pub resolution: f64,
    pub technical: f64,
    /// Unused by the default rubric.
    pub fov: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            camera: 30.0,
            lighting: 25.0,
            composition: 10.0,
            resolution: 20.0,
            technical: 15.0,
            fov: 0.0,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.camera + self.lighting + self.composition + self.resolution + self.technical + self.fov
    }
}

/// Range a technical value should fall in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdealBand {
    pub low: f64,
    pub high: f64,
    /// Distance outside the band at which the fit reaches zero.
    pub falloff: f64,
}

impl Default for IdealBand {
    fn default() -> Self {
        Self {
            low: 0.7,
            high: 0.9,
            falloff: 0.5,
        }
    }
}

impl IdealBand {
    /// 1.0 inside the band, decaying linearly to 0.0 at `falloff` away.
    pub fn fit(&self, value: f64) -> f64 {
        let distance = if value < self.low {
            self.low - value
        } else if value > self.high {
            value - self.high
        } else {
            return 1.0;
        };
        if self.falloff <= 0.0 {
            return 0.0;
        }
        (1.0 - distance / self.falloff).max(0.0)
    }
}

/// Field-of-view range worth `factor` of the FOV points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FovBand {
    pub low: f64,
    pub high: f64,
    pub factor: f64,
}

/// Heuristic lookup tables and weights.
///
/// The constants have no derivation beyond dashboard tuning, so every one of
/// them can be overridden from JSON. Missing table entries score zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRubric {
    pub weights: ScoreWeights,
    pub camera_factors: BTreeMap<CameraAngle, f64>,
    pub lighting_factors: BTreeMap<LightingSetup, f64>,
    pub preferred_compositions: Vec<String>,
    /// Both dimensions must reach this for the resolution points.
    pub full_resolution: u32,
    pub ideal_band: IdealBand,
    /// Band for texture quality. Falls back to `ideal_band` when unset.
    pub texture_band: Option<IdealBand>,
    /// Share of the technical points that reflectivity carries; texture
    /// quality gets the rest.
    pub reflectivity_share: f64,
    /// Checked in order; the first band containing the FOV applies.
    pub fov_bands: Vec<FovBand>,
}

impl Default for ScoringRubric {
    fn default() -> Self {
        let camera_factors = BTreeMap::from([
            (CameraAngle::ThreeQuarter, 1.0),
            (CameraAngle::Isometric, 0.85),
            (CameraAngle::Side, 0.6),
            (CameraAngle::Front, 0.5),
            (CameraAngle::HighAngle, 0.4),
            (CameraAngle::LowAngle, 0.4),
            (CameraAngle::Top, 0.2),
        ]);
        let lighting_factors = BTreeMap::from([
            (LightingSetup::Studio, 1.0),
            (LightingSetup::Hdr, 1.0),
            (LightingSetup::Product, 0.9),
            (LightingSetup::Soft, 0.7),
            (LightingSetup::Natural, 0.6),
            (LightingSetup::Dramatic, 0.5),
        ]);
        Self {
            weights: ScoreWeights::default(),
            camera_factors,
            lighting_factors,
            preferred_compositions: vec!["centered".to_string()],
            full_resolution: 1024,
            ideal_band: IdealBand::default(),
            texture_band: None,
            reflectivity_share: 0.5,
            fov_bands: Vec::new(),
        }
    }
}

impl ScoringRubric {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Rubric for ranking iterations of one design.
    ///
    /// Framing is fixed across an iteration run, so camera and resolution
    /// carry no points. Lighting, FOV, reflectivity, composition and texture
    /// quality are all-or-nothing checks worth 30, 20, 25, 15 and 10.
    pub fn iteration() -> Self {
        Self {
            weights: ScoreWeights {
                camera: 0.0,
                lighting: 30.0,
                composition: 15.0,
                resolution: 0.0,
                technical: 35.0,
                fov: 20.0,
            },
            lighting_factors: BTreeMap::from([
                (LightingSetup::Hdr, 1.0),
                (LightingSetup::Studio, 25.0 / 30.0),
                (LightingSetup::Dramatic, 20.0 / 30.0),
            ]),
            preferred_compositions: vec!["centered".to_string(), "rule_of_thirds".to_string()],
            ideal_band: IdealBand {
                low: 0.7,
                high: 0.9,
                falloff: 0.0,
            },
            texture_band: Some(IdealBand {
                low: 0.85,
                high: 1.0,
                falloff: 0.0,
            }),
            reflectivity_share: 25.0 / 35.0,
            fov_bands: vec![
                FovBand {
                    low: 35.0,
                    high: 55.0,
                    factor: 1.0,
                },
                FovBand {
                    low: 25.0,
                    high: 70.0,
                    factor: 0.75,
                },
            ],
            ..Self::default()
        }
    }

    fn fov_factor(&self, fov: f64) -> f64 {
        self.fov_bands
            .iter()
            .find(|band| (band.low..=band.high).contains(&fov))
            .map_or(0.0, |band| band.factor)
    }
}

/// Points earned per sub-score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub camera: f64,
    pub lighting: f64,
    pub composition: f64,
    pub resolution: f64,
    pub technical: f64,
    #[serde(default)]
    pub fov: f64,
}

impl ScoreBreakdown {
    /// Weighted sum clamped to `[0, 100]`.
    pub fn total(&self) -> f64 {
        let sum = self.camera
            + self.lighting
            + self.composition
            + self.resolution
            + self.technical
            + self.fov;
        if sum.is_nan() {
            return 0.0;
        }
        sum.clamp(0.0, 100.0)
    }
}

/// Score `params` against `rubric`.
pub fn score_parameters(params: &DesignParameters, rubric: &ScoringRubric) -> ScoreBreakdown {
    let w = &rubric.weights;
    let camera = rubric
        .camera_factors
        .get(&params.camera_angle())
        .copied()
        .unwrap_or(0.0);
    let lighting = rubric
        .lighting_factors
        .get(&params.lighting())
        .copied()
        .unwrap_or(0.0);
    let composition = if rubric
        .preferred_compositions
        .iter()
        .any(|c| c == params.composition_focus())
    {
        1.0
    } else {
        0.0
    };
    let resolution =
        if params.width() >= rubric.full_resolution && params.height() >= rubric.full_resolution {
            1.0
        } else {
            0.0
        };
    let texture_band = rubric.texture_band.as_ref().unwrap_or(&rubric.ideal_band);
    let share = rubric.reflectivity_share.clamp(0.0, 1.0);
    let technical = share * rubric.ideal_band.fit(params.reflectivity())
        + (1.0 - share) * texture_band.fit(params.texture_quality());

    ScoreBreakdown {
        camera: camera * w.camera,
        lighting: lighting * w.lighting,
        composition: composition * w.composition,
        resolution: resolution * w.resolution,
        technical: technical * w.technical,
        fov: rubric.fov_factor(params.fov()) * w.fov,
    }
}

/// Human-readable account of which sub-scores carried the total.
pub fn rationale(params: &DesignParameters, breakdown: &ScoreBreakdown, weights: &ScoreWeights) -> String {
    let mut strong: Vec<(f64, String)> = [
        (
            breakdown.camera,
            weights.camera,
            format!("{} camera angle", params.camera_angle()),
        ),
        (
            breakdown.lighting,
            weights.lighting,
            format!("{} lighting", params.lighting()),
        ),
        (
            breakdown.composition,
            weights.composition,
            format!("{} composition", params.composition_focus()),
        ),
        (
            breakdown.resolution,
            weights.resolution,
            format!("{}x{} resolution", params.width(), params.height()),
        ),
        (
            breakdown.technical,
            weights.technical,
            "reflectivity and texture quality in the ideal band".to_string(),
        ),
        (
            breakdown.fov,
            weights.fov,
            format!("{:.1} degree field of view", params.fov()),
        ),
    ]
    .into_iter()
    .filter(|(points, weight, _)| *weight > 0.0 && *points >= weight / 2.0)
    .map(|(points, weight, label)| (points, format!("Strong {label} ({points:.1}/{weight:.0})")))
    .collect();
    strong.sort_by(|a, b| b.0.total_cmp(&a.0));

    let total = breakdown.total();
    let tier = if total >= 70.0 {
        "High overall quality"
    } else if total >= 50.0 {
        "Acceptable overall quality"
    } else {
        "Low overall quality"
    };

    let mut parts: Vec<String> = strong.into_iter().map(|(_, text)| text).collect();
    parts.push(format!("{tier} (score {total:.1})"));
    parts.join(". ")
}

/// Follow-up changes worth trying on top of a chosen design.
pub fn improvement_suggestions(params: &DesignParameters) -> Vec<String> {
    let mut suggestions = Vec::new();
    if params.reflectivity() < 0.75 {
        suggestions.push("Consider increasing reflectivity for a more premium appearance".to_string());
    }
    if params.lighting() != LightingSetup::Hdr {
        suggestions.push("Try HDR lighting for enhanced dynamic range".to_string());
    }
    if params.texture_quality() < 0.9 {
        suggestions.push("Increase texture quality to 0.9+ for production assets".to_string());
    }
    if params.bit_depth() < 16 {
        suggestions.push("Use 16-bit depth for professional post-production".to_string());
    }
    suggestions
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub design_id: DesignId,
    /// Position of the candidate in the input; breaks ties.
    pub slot: usize,
    pub score: f64,
    pub rationale: String,
    pub breakdown: ScoreBreakdown,
}

/// Outcome of a selection: the winner plus the full ranking.
#[derive(Debug, Clone, Serialize)]
pub struct Selection {
    pub best: Arc<DesignResult>,
    /// Sorted by descending score.
    pub ranked: Vec<ScoreEntry>,
    pub considered: usize,
    pub skipped: usize,
}

impl Selection {
    pub fn best_entry(&self) -> &ScoreEntry {
        // `select_best` never builds a selection with an empty ranking.
        &self.ranked[0]
    }

    pub fn best_score(&self) -> f64 {
        self.best_entry().score
    }
}

/// Pick the best successful candidate.
///
/// # Errors
///
/// [`SelectionError::NoCandidates`] when no candidate succeeded. No ranking
/// is produced in that case.
#[instrument(skip_all, fields(candidates = candidates.len()))]
pub fn select_best(
    candidates: &[Arc<DesignResult>],
    rubric: &ScoringRubric,
) -> Result<Selection, SelectionError> {
    let mut ranked: Vec<ScoreEntry> = candidates
        .iter()
        .enumerate()
        .filter(|(_, candidate)| candidate.success)
        .map(|(slot, candidate)| {
            let breakdown = score_parameters(&candidate.parameters, rubric);
            ScoreEntry {
                design_id: candidate.design_id.clone(),
                slot,
                score: breakdown.total(),
                rationale: rationale(&candidate.parameters, &breakdown, &rubric.weights),
                breakdown,
            }
        })
        .collect();

    if ranked.is_empty() {
        return Err(SelectionError::NoCandidates {
            total: candidates.len(),
        });
    }

    // Stable sort: equal scores keep input order.
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

    let best = Arc::clone(&candidates[ranked[0].slot]);
    let considered = ranked.len();
    let skipped = candidates.len() - considered;

    METRICS.inc_selections();
    obs::emit_selection_made(best.design_id.as_str(), ranked[0].score, considered, skipped);

    Ok(Selection {
        best,
        ranked,
        considered,
        skipped,
    })
}
