//! Selection scorer behaviour over variant sets.

use std::collections::BTreeMap;
use std::sync::Arc;

use designforge_core::fakes::{MemoryImageStore, StubGenerator};
use designforge_core::{
    improvement_suggestions, score_parameters, select_best, CameraAngle, DesignId,
    DesignParameters, DesignResult, FailureKind, GenerationClient, ImageReference, LightingSetup,
    OrchestratorConfig, ProductCategory, ProviderError, ProviderKind, ScoringRubric,
    SelectionError, VariantOrchestrator,
};

fn params() -> DesignParameters {
    DesignParameters::new("graphite running shoe", ProductCategory::Other)
}

fn succeeded(params: DesignParameters) -> Arc<DesignResult> {
    let id = DesignId::generate();
    let image = ImageReference {
        path: format!("memory/design_{id}.png").into(),
        url: format!("/api/images/design_{id}.png"),
        sha256: String::new(),
        size_bytes: 0,
    };
    Arc::new(DesignResult::succeeded(id, params, image, BTreeMap::new()))
}

fn failed(params: DesignParameters) -> Arc<DesignResult> {
    let err = ProviderError::from_kind(FailureKind::Upstream, ProviderKind::Fal, "bad gateway");
    Arc::new(DesignResult::failed(params, &err))
}

#[test]
fn test_three_quarter_ranks_above_top() {
    let top = succeeded(params().with_camera_angle(CameraAngle::Top));
    let tq = succeeded(params().with_camera_angle(CameraAngle::ThreeQuarter));

    let selection = select_best(&[top.clone(), tq.clone()], &ScoringRubric::default()).unwrap();

    assert!(Arc::ptr_eq(&selection.best, &tq));
    assert_eq!(selection.ranked[0].design_id, tq.design_id);
    assert_eq!(selection.ranked[1].design_id, top.design_id);
    assert!(selection.ranked[0].score > selection.ranked[1].score);
}

#[test]
fn test_single_success_is_scored_from_its_own_parameters() {
    let only = succeeded(
        params()
            .with_camera_angle(CameraAngle::Side)
            .with_lighting(LightingSetup::Natural)
            .with_reflectivity(0.2),
    );
    let rubric = ScoringRubric::default();

    let selection = select_best(
        &[failed(params()), only.clone(), failed(params())],
        &rubric,
    )
    .unwrap();

    let expected = score_parameters(&only.parameters, &rubric).total();
    assert!(Arc::ptr_eq(&selection.best, &only));
    assert_eq!(selection.best_score(), expected);
    assert_eq!(selection.ranked.len(), 1);
    assert_eq!(selection.considered, 1);
    assert_eq!(selection.skipped, 2);
    assert_eq!(selection.best_entry().slot, 1);
}

#[test]
fn test_zero_successes_fails_with_no_candidates() {
    let err = select_best(&[failed(params()), failed(params())], &ScoringRubric::default())
        .unwrap_err();
    assert_eq!(err, SelectionError::NoCandidates { total: 2 });

    let err = select_best(&[], &ScoringRubric::default()).unwrap_err();
    assert_eq!(err, SelectionError::NoCandidates { total: 0 });
}

#[test]
fn test_ties_keep_first_seen_order() {
    let first = succeeded(params());
    let second = succeeded(params());
    let third = succeeded(params().with_lighting(LightingSetup::Dramatic));

    let selection = select_best(
        &[third.clone(), first.clone(), second.clone()],
        &ScoringRubric::default(),
    )
    .unwrap();

    assert!(Arc::ptr_eq(&selection.best, &first));
    let order: Vec<usize> = selection.ranked.iter().map(|e| e.slot).collect();
    assert_eq!(order, vec![1, 2, 0]);
}

#[test]
fn test_scores_stay_within_bounds_for_custom_rubric() {
    let mut rubric = ScoringRubric::default();
    rubric.weights.camera = 500.0;

    let selection = select_best(&[succeeded(params())], &rubric).unwrap();
    assert_eq!(selection.best_score(), 100.0);

    rubric.weights.camera = -500.0;
    let selection = select_best(&[succeeded(params())], &rubric).unwrap();
    assert_eq!(selection.best_score(), 0.0);
}

#[test]
fn test_rationale_names_dominant_sub_scores() {
    let selection = select_best(&[succeeded(params())], &ScoringRubric::default()).unwrap();
    let rationale = &selection.best_entry().rationale;
    assert!(rationale.starts_with("Strong three_quarter camera angle (30.0/30)"));
    assert!(rationale.ends_with("High overall quality (score 100.0)"));
}

#[tokio::test]
async fn test_selects_from_orchestrated_variant_set() {
    let client = GenerationClient::new(Arc::new(MemoryImageStore::new()))
        .with_generator(Arc::new(StubGenerator::succeeding(ProviderKind::Fal)));
    let orch = VariantOrchestrator::new(Arc::new(client), OrchestratorConfig::default());

    let run = orch.run(&params(), 6).await.unwrap();
    let selection = select_best(&run.variant_set.results(), &ScoringRubric::default()).unwrap();

    // Slot 0 is three-quarter under studio lighting with the base palette.
    assert_eq!(selection.best_entry().slot, 0);
    assert_eq!(selection.ranked.len(), 6);
}

#[tokio::test]
async fn test_iteration_rubric_prefers_hdr_step() {
    let client = GenerationClient::new(Arc::new(MemoryImageStore::new()))
        .with_generator(Arc::new(StubGenerator::succeeding(ProviderKind::Fal)));
    let orch = VariantOrchestrator::new(Arc::new(client), OrchestratorConfig::default());

    let run = orch.run_iterations(&params(), 4).await.unwrap();
    let selection = select_best(&run.variant_set.results(), &ScoringRubric::iteration()).unwrap();

    // Step 2 is the HDR one; its FOV (50) and reflectivity (0.8) sit in band.
    assert_eq!(selection.best_entry().slot, 1);
    assert_eq!(selection.best.parameters.lighting(), LightingSetup::Hdr);
    assert!((selection.best_score() - 100.0).abs() < 1e-9);
    assert!(improvement_suggestions(&selection.best.parameters).is_empty());
}
