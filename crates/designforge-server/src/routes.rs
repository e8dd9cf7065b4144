//! HTTP surface under `/api`.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;

use designforge_core::{
    analyze_manufacturability, apply_updates, assemble_comparison, improvement_suggestions,
    resolve_request, select_best, translate_storyboard, ComparisonError, DesignResult,
    FailureKind, ImageKind, ProductCategory, ProviderKind, VERSION,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{info, instrument};
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::api::{
    bad_request, business_failure, comparison_failure, handle_rejection, internal_fault,
    orchestration_failure, provider_failure, selection_failure, success, ComparisonRequest,
    IterationsRequest, ManufacturabilityRequest, ParametersRequest, SelectBestRequest,
    SelectIterationRequest, StoryboardRequest, VariantsRequest,
};
use crate::state::AppState;

/// Largest accepted JSON body.
const MAX_BODY_BYTES: u64 = 1024 * 1024;

fn with_state(
    state: Arc<AppState>,
) -> impl Filter<Extract = (Arc<AppState>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&state))
}

fn json_body<T: DeserializeOwned + Send>() -> impl Filter<Extract = (T,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// Every endpoint, with rejection handling and request tracing applied.
pub fn routes(
    state: Arc<AppState>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let health = warp::path!("api" / "health")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(health);

    let generate = warp::path!("api" / "generate")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(json_body::<Value>())
        .and_then(generate);

    let variants = warp::path!("api" / "variants")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(json_body::<VariantsRequest>())
        .and_then(variants);

    let select = warp::path!("api" / "select-best")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(json_body::<SelectBestRequest>())
        .and_then(select_best_design);

    let iterations = warp::path!("api" / "iterations")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(json_body::<IterationsRequest>())
        .and_then(iterations);

    let select_iteration = warp::path!("api" / "iterations" / "select-best")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(json_body::<SelectIterationRequest>())
        .and_then(select_best_iteration);

    let storyboard = warp::path!("api" / "storyboard" / "translate")
        .and(warp::post())
        .and(json_body::<StoryboardRequest>())
        .and_then(storyboard);

    let comparison = warp::path!("api" / "comparison")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(json_body::<ComparisonRequest>())
        .and_then(comparison);

    let manufacturability = warp::path!("api" / "manufacturability")
        .and(warp::post())
        .and(json_body::<ManufacturabilityRequest>())
        .and_then(manufacturability);

    let parameters = warp::path!("api" / "parameters")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(json_body::<ParametersRequest>())
        .and_then(update_parameters);

    let images = warp::path("api")
        .and(warp::path("images"))
        .and(warp::get())
        .and(warp::fs::dir(state.output_dir.clone()));

    health
        .or(generate)
        .or(variants)
        .or(select)
        .or(iterations)
        .or(select_iteration)
        .or(storyboard)
        .or(comparison)
        .or(manufacturability)
        .or(parameters)
        .or(images)
        .recover(handle_rejection)
        .with(warp::trace::request())
}

async fn health(state: Arc<AppState>) -> Result<Response, Rejection> {
    let configured = state.client.providers();
    let services: BTreeMap<&str, &str> = ProviderKind::ALL
        .into_iter()
        .map(|p| {
            let status = if configured.contains(&p) {
                "available"
            } else {
                "unconfigured"
            };
            (p.as_str(), status)
        })
        .collect();

    Ok(success(&json!({
        "status": "healthy",
        "version": VERSION,
        "providers": configured,
        "services": services,
    })))
}

#[instrument(skip_all)]
async fn generate(state: Arc<AppState>, body: Value) -> Result<Response, Rejection> {
    let params = resolve_request(body).map_err(bad_request)?;
    let provider = params.provider();

    let result = match state
        .client
        .generate(provider, &params, ImageKind::Design)
        .await
    {
        Ok(result) => Arc::new(result),
        Err(err) if err.kind() == FailureKind::Storage => return Err(internal_fault(err)),
        Err(err) => return Ok(provider_failure(&err)),
    };
    state.registry.register(Arc::clone(&result));
    info!(design_id = %result.design_id, provider = %provider, "design generated");

    let image = result.image_reference.as_ref();
    Ok(success(&json!({
        "success": true,
        "design_id": result.design_id,
        "filepath": image.map(|i| &i.path),
        "image_url": result.image_url(),
        "parameters": result.parameters.display_params(),
        "metadata": result.metadata,
        "design": result,
    })))
}

#[instrument(skip_all, fields(num_variants = ?request.num_variants))]
async fn variants(state: Arc<AppState>, request: VariantsRequest) -> Result<Response, Rejection> {
    let base = resolve_request(request.base_params).map_err(bad_request)?;
    let count = request
        .num_variants
        .unwrap_or(state.orchestrator.config().default_variants);

    let run = match state.orchestrator.run(&base, count).await {
        Ok(run) => run,
        Err(err) => return orchestration_failure(&err),
    };
    state.registry.register_all(run.variant_set.results());

    Ok(success(&json!({
        "success": true,
        "run_id": run.variant_set.run_id,
        "variants": run.variant_set.variants,
        "consistency_report": run.report,
        "total_generated": run.report.successful,
        "total_requested": run.report.total_designs,
    })))
}

#[instrument(skip_all, fields(designs = request.designs.len()))]
async fn select_best_design(
    state: Arc<AppState>,
    request: SelectBestRequest,
) -> Result<Response, Rejection> {
    let candidates = match state.resolve_candidates(request.designs) {
        Ok(candidates) => candidates,
        Err(ids) => return Ok(comparison_failure(&ComparisonError::UnknownDesign { ids })),
    };

    let selection = match select_best(&candidates, &state.rubric) {
        Ok(selection) => selection,
        Err(err) => return Ok(selection_failure(&err)),
    };
    let best = selection.best_entry();

    Ok(success(&json!({
        "success": true,
        "best_design": selection.best,
        "score": best.score,
        "reasoning": best.rationale,
        "all_scores": selection.ranked,
        "considered": selection.considered,
        "skipped": selection.skipped,
    })))
}

#[instrument(skip_all, fields(num_iterations = ?request.num_iterations))]
async fn iterations(
    state: Arc<AppState>,
    request: IterationsRequest,
) -> Result<Response, Rejection> {
    let base = resolve_request(request.base_params).map_err(bad_request)?;
    let count = request
        .num_iterations
        .unwrap_or(state.orchestrator.config().default_variants);

    let run = match state.orchestrator.run_iterations(&base, count).await {
        Ok(run) => run,
        Err(err) => return orchestration_failure(&err),
    };
    state.registry.register_all(run.variant_set.results());

    Ok(success(&json!({
        "success": true,
        "run_id": run.variant_set.run_id,
        "iterations": run.variant_set.variants,
        "consistency_report": run.report,
        "total_generated": run.report.successful,
        "total_requested": run.report.total_designs,
    })))
}

#[instrument(skip_all, fields(iterations = request.iterations.len()))]
async fn select_best_iteration(
    state: Arc<AppState>,
    request: SelectIterationRequest,
) -> Result<Response, Rejection> {
    let candidates = match state.resolve_candidates(request.iterations) {
        Ok(candidates) => candidates,
        Err(ids) => return Ok(comparison_failure(&ComparisonError::UnknownDesign { ids })),
    };

    let selection = match select_best(&candidates, &state.iteration_rubric) {
        Ok(selection) => selection,
        Err(err) => return Ok(selection_failure(&err)),
    };
    let best = selection.best_entry();

    Ok(success(&json!({
        "success": true,
        "best_iteration": selection.best,
        "score": best.score,
        "reasoning": best.rationale,
        "all_scores": selection.ranked,
        "improvement_suggestions": improvement_suggestions(&selection.best.parameters),
        "considered": selection.considered,
        "skipped": selection.skipped,
    })))
}

async fn storyboard(request: StoryboardRequest) -> Result<Response, Rejection> {
    let plan = translate_storyboard(&request.storyboard_sequence);
    Ok(success(&json!({
        "success": true,
        "translated_frames": plan.frames,
        "total_frames": plan.total_frames,
        "estimated_duration": plan.estimated_duration_secs,
        "narrative_structure": plan.narrative_structure,
    })))
}

#[instrument(skip_all, fields(designs = request.design_ids.len()))]
async fn comparison(state: Arc<AppState>, request: ComparisonRequest) -> Result<Response, Rejection> {
    let bundle = match assemble_comparison(&state.registry, &request.design_ids) {
        Ok(bundle) => bundle,
        Err(err) => return Ok(comparison_failure(&err)),
    };

    Ok(success(&json!({
        "success": true,
        "comparison_id": bundle.comparison_id,
        "compared_designs": bundle.design_ids(),
        "image_urls": bundle.image_urls(),
        "total_compared": bundle.total_compared(),
        "entries": bundle.entries,
    })))
}

async fn manufacturability(request: ManufacturabilityRequest) -> Result<Response, Rejection> {
    let data = request.design_data;
    let analysis = analyze_manufacturability(
        data.material,
        data.product_category.unwrap_or(ProductCategory::Other),
    );
    Ok(success(&json!({
        "success": true,
        "analysis": analysis,
    })))
}

#[instrument(skip_all, fields(design_id = %request.design_id))]
async fn update_parameters(
    state: Arc<AppState>,
    request: ParametersRequest,
) -> Result<Response, Rejection> {
    let Some(current) = state.registry.get(&request.design_id) else {
        return Ok(business_failure(
            "unknown_design",
            format!("unknown design id(s): {}", request.design_id),
        ));
    };
    let merged = apply_updates(&current.parameters, request.updates).map_err(bad_request)?;

    let mut updated = DesignResult::clone(&current);
    updated.parameters = merged;
    let display = updated.parameters.display_params();
    let parameters = serde_json::to_value(&updated.parameters).map_err(internal_fault)?;
    state.registry.register(Arc::new(updated));

    Ok(success(&json!({
        "success": true,
        "design_id": request.design_id,
        "updated_parameters": display,
        "parameters": parameters,
    })))
}
