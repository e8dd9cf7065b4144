//! The `/api` surface end to end, with a stub generator behind it.

use std::sync::Arc;
use std::time::Duration;

use designforge_core::fakes::{stub_image, StubGenerator, STUB_IMAGE_BYTES};
use designforge_core::{
    FailureKind, FsImageStore, GenerationClient, LightingSetup, OrchestratorConfig, ProviderError,
    ProviderKind, ScoringRubric,
};
use designforge_server::{routes, AppState, IMAGE_URL_PREFIX};
use serde_json::{json, Value};
use tempfile::TempDir;
use warp::http::StatusCode;

struct Harness {
    state: Arc<AppState>,
    _dir: TempDir,
}

impl Harness {
    fn new(generator: StubGenerator) -> Self {
        Self::with_config(generator, OrchestratorConfig::default())
    }

    fn with_config(generator: StubGenerator, config: OrchestratorConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path(), IMAGE_URL_PREFIX).unwrap();
        let client = GenerationClient::new(Arc::new(store)).with_generator(Arc::new(generator));
        let state = AppState::new(
            Arc::new(client),
            config,
            ScoringRubric::default(),
            dir.path(),
        );
        Self {
            state: Arc::new(state),
            _dir: dir,
        }
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let api = routes(Arc::clone(&self.state));
        let response = warp::test::request()
            .method("POST")
            .path(path)
            .json(&body)
            .reply(&api)
            .await;
        let status = response.status();
        (status, serde_json::from_slice(response.body()).unwrap())
    }

    async fn get(&self, path: &str) -> warp::http::Response<warp::hyper::body::Bytes> {
        let api = routes(Arc::clone(&self.state));
        warp::test::request().method("GET").path(path).reply(&api).await
    }
}

fn dramatic_fails() -> StubGenerator {
    StubGenerator::with_policy(ProviderKind::Fal, |params| {
        if params.lighting() == LightingSetup::Dramatic {
            Err(ProviderError::Network {
                provider: ProviderKind::Fal,
                message: "connection reset".to_string(),
            })
        } else {
            Ok(stub_image(ProviderKind::Fal, params))
        }
    })
}

fn base_params() -> Value {
    json!({"prompt": "aluminium bluetooth speaker", "product_type": "electronics"})
}

fn design_ids(variants: &Value) -> Vec<String> {
    variants["variants"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|v| v["success"] == true)
        .map(|v| v["design_id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_health_reports_configured_providers() {
    let h = Harness::new(StubGenerator::succeeding(ProviderKind::Fal));
    let response = h.get("/api/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["providers"], json!(["fal"]));
    assert_eq!(body["services"]["fal"], "available");
    assert_eq!(body["services"]["bria"], "unconfigured");
}

#[tokio::test]
async fn test_generate_persists_and_serves_image() {
    let h = Harness::new(StubGenerator::succeeding(ProviderKind::Fal));
    let (status, body) = h.post("/api/generate", base_params()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let image_url = body["image_url"].as_str().unwrap();
    assert!(image_url.starts_with("/api/images/design_"));
    // Electronics preset: isometric camera.
    assert_eq!(body["parameters"]["Camera"], "Isometric");
    assert_eq!(body["metadata"]["provider"], "fal");

    let image = h.get(image_url).await;
    assert_eq!(image.status(), StatusCode::OK);
    assert_eq!(image.body().as_ref(), STUB_IMAGE_BYTES);
}

#[tokio::test]
async fn test_generate_missing_prompt_is_bad_request() {
    let h = Harness::new(StubGenerator::succeeding(ProviderKind::Fal));
    let (status, body) = h.post("/api/generate", json!({"product_type": "car"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("prompt"));
}

#[tokio::test]
async fn test_generate_with_unconfigured_provider_is_business_failure() {
    let h = Harness::new(StubGenerator::succeeding(ProviderKind::Fal));
    let mut request = base_params();
    request["api_provider"] = json!("bria");
    let (status, body) = h.post("/api/generate", request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "unconfigured");
}

#[tokio::test]
async fn test_generate_provider_failure_is_business_failure() {
    let h = Harness::new(StubGenerator::failing(ProviderKind::Fal, FailureKind::RateLimited));
    let (status, body) = h.post("/api/generate", base_params()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "rate_limited");
}

#[tokio::test]
async fn test_variants_all_succeed() {
    let h = Harness::new(StubGenerator::succeeding(ProviderKind::Fal));
    let (status, body) = h
        .post("/api/variants", json!({"base_params": base_params(), "num_variants": 4}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["total_generated"], 4);
    assert_eq!(body["consistency_report"]["consistency_score"], 100.0);
    assert_eq!(body["consistency_report"]["recommendations"], json!([]));

    let variants = body["variants"].as_array().unwrap();
    assert_eq!(variants.len(), 4);
    for (slot, variant) in variants.iter().enumerate() {
        assert_eq!(variant["slot"], slot);
        assert_eq!(variant["variant_id"], format!("variant_{slot}"));
    }
}

#[tokio::test]
async fn test_variants_partial_failure_still_reports_every_slot() {
    let h = Harness::new(dramatic_fails());
    let (status, body) = h
        .post("/api/variants", json!({"base_params": base_params(), "num_variants": 6}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["variants"].as_array().unwrap().len(), 6);
    assert_eq!(body["total_generated"], 3);
    assert_eq!(body["consistency_report"]["failed"], 3);
    assert_eq!(body["consistency_report"]["consistency_score"], 50.0);
    assert_eq!(body["variants"][1]["failure"]["kind"], "network");
}

#[tokio::test]
async fn test_variants_default_count() {
    let h = Harness::new(StubGenerator::succeeding(ProviderKind::Fal));
    let (_, body) = h.post("/api/variants", json!({"base_params": base_params()})).await;
    assert_eq!(body["total_requested"], 4);
}

#[tokio::test]
async fn test_variants_out_of_range_count_is_business_failure() {
    let h = Harness::new(StubGenerator::succeeding(ProviderKind::Fal));
    for count in [0, 13] {
        let (status, body) = h
            .post("/api/variants", json!({"base_params": base_params(), "num_variants": count}))
            .await;
        assert_eq!(status, StatusCode::OK, "count = {count}");
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "invalid_variant_count");
    }
}

#[tokio::test]
async fn test_variants_negative_count_is_bad_request() {
    let h = Harness::new(StubGenerator::succeeding(ProviderKind::Fal));
    let (status, _) = h
        .post("/api/variants", json!({"base_params": base_params(), "num_variants": -1}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_variants_timeout_is_single_failure() {
    let config = OrchestratorConfig {
        run_timeout: Some(Duration::from_millis(20)),
        ..OrchestratorConfig::default()
    };
    let slow = StubGenerator::succeeding(ProviderKind::Fal).with_delay(Duration::from_secs(5));
    let h = Harness::with_config(slow, config);

    let (status, body) = h
        .post("/api/variants", json!({"base_params": base_params(), "num_variants": 2}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "timed_out");
    assert!(body.get("variants").is_none());
}

#[tokio::test]
async fn test_select_best_prefers_three_quarter_studio() {
    let h = Harness::new(StubGenerator::succeeding(ProviderKind::Fal));
    let (_, run) = h
        .post("/api/variants", json!({"base_params": base_params(), "num_variants": 4}))
        .await;
    let ids = design_ids(&run);

    let (status, body) = h.post("/api/select-best", json!({"designs": ids})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    // Slot 0 is three-quarter view under studio lighting.
    assert_eq!(body["best_design"]["design_id"], ids[0].as_str());
    assert_eq!(body["best_design"]["parameters"]["camera_angle"], "three_quarter");
    assert_eq!(body["all_scores"].as_array().unwrap().len(), 4);
    assert!(body["reasoning"].as_str().unwrap().contains("overall quality"));
    assert!(body["score"].as_f64().unwrap() > body["all_scores"][3]["score"].as_f64().unwrap());
}

#[tokio::test]
async fn test_select_best_accepts_full_results() {
    let h = Harness::new(StubGenerator::succeeding(ProviderKind::Fal));
    let (_, run) = h
        .post("/api/variants", json!({"base_params": base_params(), "num_variants": 2}))
        .await;
    let results: Vec<Value> = run["variants"].as_array().unwrap().clone();

    let (status, body) = h.post("/api/select-best", json!({"designs": results})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["considered"], 2);
}

#[tokio::test]
async fn test_select_best_without_candidates() {
    let h = Harness::new(StubGenerator::succeeding(ProviderKind::Fal));
    let (status, body) = h.post("/api/select-best", json!({"designs": []})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "no_candidates");
    assert!(body.get("best_design").is_none());
}

#[tokio::test]
async fn test_select_best_all_failed() {
    let h = Harness::new(StubGenerator::failing(ProviderKind::Fal, FailureKind::Authentication));
    let (_, run) = h
        .post("/api/variants", json!({"base_params": base_params(), "num_variants": 3}))
        .await;
    assert_eq!(run["total_generated"], 0);
    let ids: Vec<Value> = run["variants"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["design_id"].clone())
        .collect();

    let (status, body) = h.post("/api/select-best", json!({"designs": ids})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "no_candidates");
}

#[tokio::test]
async fn test_comparison_preserves_request_order() {
    let h = Harness::new(StubGenerator::succeeding(ProviderKind::Fal));
    let (_, run) = h
        .post("/api/variants", json!({"base_params": base_params(), "num_variants": 3}))
        .await;
    let mut ids = design_ids(&run);
    ids.reverse();

    let (status, body) = h.post("/api/comparison", json!({"design_ids": ids})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["total_compared"], 3);
    assert_eq!(body["compared_designs"], json!(ids));
    let urls = body["image_urls"].as_array().unwrap();
    for (url, id) in urls.iter().zip(&ids) {
        assert!(url.as_str().unwrap().contains(id.as_str()));
    }
}

#[tokio::test]
async fn test_comparison_business_failures() {
    let h = Harness::new(StubGenerator::succeeding(ProviderKind::Fal));
    let (_, generated) = h.post("/api/generate", base_params()).await;
    let known = generated["design_id"].as_str().unwrap().to_string();

    let (status, body) = h.post("/api/comparison", json!({"design_ids": [known]})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "too_few_designs");

    let (status, body) = h
        .post("/api/comparison", json!({"design_ids": [known, "20200101_000000_deadbeef"]}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "unknown_design");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("20200101_000000_deadbeef"));
}

#[tokio::test]
async fn test_manufacturability_lookup() {
    let h = Harness::new(StubGenerator::succeeding(ProviderKind::Fal));
    let (status, body) = h
        .post(
            "/api/manufacturability",
            json!({"design_data": {"material": "carbon_fiber", "product_type": "car"}}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analysis"]["estimated_cost_tier"], "high");
    assert_eq!(body["analysis"]["manufacturing_methods"], json!(["composite_layup"]));
}

#[tokio::test]
async fn test_parameter_updates_merge_and_revalidate() {
    let h = Harness::new(StubGenerator::succeeding(ProviderKind::Fal));
    let (_, generated) = h.post("/api/generate", base_params()).await;
    let id = generated["design_id"].as_str().unwrap().to_string();

    let (status, body) = h
        .post(
            "/api/parameters",
            json!({"design_id": id, "updates": {"camera_angle": "side", "fov": 70.0}}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["updated_parameters"]["Camera"], "Side");
    assert_eq!(body["parameters"]["fov"], 70.0);

    let (status, _) = h
        .post("/api/parameters", json!({"design_id": id, "updates": {"fov": 500.0}}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = h
        .post("/api/parameters", json!({"design_id": "missing", "updates": {}}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "unknown_design");
}

#[tokio::test]
async fn test_malformed_requests_get_client_errors() {
    let h = Harness::new(StubGenerator::succeeding(ProviderKind::Fal));
    let api = routes(Arc::clone(&h.state));

    let response = warp::test::request()
        .method("POST")
        .path("/api/comparison")
        .header("content-type", "application/json")
        .body("{not json")
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = h.get("/api/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_iterations_step_lighting_and_keep_failed_steps() {
    let h = Harness::new(dramatic_fails());
    let (status, body) = h
        .post("/api/iterations", json!({"base_params": base_params(), "num_iterations": 4}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["total_requested"], 4);
    assert_eq!(body["total_generated"], 3);
    assert_eq!(body["consistency_report"]["consistency_score"], 75.0);

    let iterations = body["iterations"].as_array().unwrap();
    assert_eq!(iterations.len(), 4);
    assert_eq!(iterations[0]["variant_id"], "iteration_1");
    assert_eq!(iterations[0]["variation_type"], "lighting_studio_fov_47.5");
    assert_eq!(iterations[1]["parameters"]["lighting"], "hdr");
    assert_eq!(iterations[2]["success"], false);
    assert_eq!(iterations[2]["failure"]["kind"], "network");
    assert!(iterations[0]["image_reference"]["url"]
        .as_str()
        .unwrap()
        .starts_with("/api/images/iteration_"));
}

#[tokio::test]
async fn test_iterations_default_and_out_of_range_counts() {
    let h = Harness::new(StubGenerator::succeeding(ProviderKind::Fal));
    let (_, body) = h.post("/api/iterations", json!({"base_params": base_params()})).await;
    assert_eq!(body["total_requested"], 4);

    let (status, body) = h
        .post("/api/iterations", json!({"base_params": base_params(), "num_iterations": 13}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "invalid_variant_count");
}

#[tokio::test]
async fn test_select_best_iteration_prefers_hdr_step() {
    let h = Harness::new(StubGenerator::succeeding(ProviderKind::Fal));
    let (_, run) = h
        .post("/api/iterations", json!({"base_params": base_params(), "num_iterations": 4}))
        .await;
    let ids: Vec<String> = run["iterations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["design_id"].as_str().unwrap().to_string())
        .collect();

    let (status, body) = h
        .post("/api/iterations/select-best", json!({"iterations": ids}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["best_iteration"]["design_id"], ids[1].as_str());
    assert!((body["score"].as_f64().unwrap() - 100.0).abs() < 1e-9);
    assert_eq!(body["improvement_suggestions"], json!([]));
    assert_eq!(body["all_scores"].as_array().unwrap().len(), 4);
    assert!(body["reasoning"].as_str().unwrap().contains("field of view"));
}

#[tokio::test]
async fn test_select_best_iteration_accepts_returned_entries() {
    let h = Harness::new(StubGenerator::succeeding(ProviderKind::Fal));
    let (_, run) = h
        .post("/api/iterations", json!({"base_params": base_params(), "num_iterations": 2}))
        .await;
    let entries = run["iterations"].clone();

    let (_, body) = h
        .post("/api/iterations/select-best", json!({"iterations": entries}))
        .await;
    assert_eq!(body["success"], true);
    // With two steps the HDR one lands at reflectivity 0.92, outside the band.
    assert_eq!(body["best_iteration"]["parameters"]["lighting"], "studio");
    assert_eq!(body["considered"], 2);
    assert_eq!(
        body["improvement_suggestions"],
        json!(["Try HDR lighting for enhanced dynamic range"])
    );
}

#[tokio::test]
async fn test_select_best_iteration_business_failures() {
    let h = Harness::new(StubGenerator::failing(ProviderKind::Fal, FailureKind::Upstream));
    let (_, run) = h
        .post("/api/iterations", json!({"base_params": base_params(), "num_iterations": 3}))
        .await;
    let entries = run["iterations"].clone();

    let (status, body) = h
        .post("/api/iterations/select-best", json!({"iterations": entries}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "no_candidates");

    let (_, body) = h
        .post(
            "/api/iterations/select-best",
            json!({"iterations": ["20260101_000000_deadbeef"]}),
        )
        .await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "unknown_design");
}

#[tokio::test]
async fn test_storyboard_translation_plans_every_frame() {
    let h = Harness::new(StubGenerator::succeeding(ProviderKind::Fal));
    let sequence = json!([
        {"params": {"prompt": "speaker on a desk"}},
        {"params": {"prompt": "speaker grille close-up"}},
        {"params": {"prompt": "speaker hero shot"}}
    ]);
    let (status, body) = h
        .post("/api/storyboard/translate", json!({"storyboard_sequence": sequence}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["total_frames"], 3);
    assert_eq!(body["estimated_duration"], 8.0);

    let frames = body["translated_frames"].as_array().unwrap();
    assert_eq!(frames[0]["narrative_role"], "establishing_shot");
    assert_eq!(frames[0]["transition"], "fade_in");
    // Middle frame sits at position 0.5.
    assert_eq!(frames[1]["camera_angle"], "three_quarter");
    assert_eq!(frames[1]["lighting"], "hdr");
    assert_eq!(frames[1]["translated_params"]["prompt"], "speaker grille close-up");
    assert_eq!(frames[2]["translated_params"]["camera_angle"], "front");
    assert_eq!(body["narrative_structure"]["climax_frame"], 3);
}

#[tokio::test]
async fn test_storyboard_rejects_malformed_sequence() {
    let h = Harness::new(StubGenerator::succeeding(ProviderKind::Fal));
    let (status, body) = h
        .post("/api/storyboard/translate", json!({"storyboard_sequence": "three frames"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_registry_forgets_oldest_designs_past_capacity() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsImageStore::new(dir.path(), IMAGE_URL_PREFIX).unwrap();
    let client = GenerationClient::new(Arc::new(store))
        .with_generator(Arc::new(StubGenerator::succeeding(ProviderKind::Fal)));
    let state = AppState::new(
        Arc::new(client),
        OrchestratorConfig::default(),
        ScoringRubric::default(),
        dir.path(),
    )
    .with_max_designs(2);
    let h = Harness {
        state: Arc::new(state),
        _dir: dir,
    };

    let (_, run) = h
        .post("/api/variants", json!({"base_params": base_params(), "num_variants": 3}))
        .await;
    let ids = design_ids(&run);
    assert_eq!(h.state.registry.len(), 2);

    let (_, body) = h
        .post("/api/comparison", json!({"design_ids": [ids[0], ids[2]]}))
        .await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "unknown_design");

    let (_, body) = h
        .post("/api/comparison", json!({"design_ids": [ids[1], ids[2]]}))
        .await;
    assert_eq!(body["success"], true);
}
