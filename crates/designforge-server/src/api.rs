//! Request bodies, response envelopes and the rejection mapping.
//!
//! Business failures (no candidates, unknown ids, failed generations) are
//! answered with `200 {"success": false, "error": <code>, "message": ...}`.
//! Only malformed requests and unhandled faults get a 4xx/5xx status.

use std::convert::Infallible;
use std::fmt::Display;

use designforge_core::{
    ComparisonError, DesignId, DesignResult, FailureKind, MaterialType, OrchestrationError,
    ProductCategory, ProviderError, SelectionError, StoryboardFrame,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Rejection, Reply};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct VariantsRequest {
    #[serde(default)]
    pub base_params: Value,
    #[serde(default)]
    pub num_variants: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct IterationsRequest {
    #[serde(default)]
    pub base_params: Value,
    #[serde(default)]
    pub num_iterations: Option<usize>,
}

/// A candidate for selection: a registered id or a full result.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DesignRef {
    Id(DesignId),
    Result(Box<DesignResult>),
}

#[derive(Debug, Deserialize)]
pub struct SelectBestRequest {
    #[serde(default)]
    pub designs: Vec<DesignRef>,
}

#[derive(Debug, Deserialize)]
pub struct SelectIterationRequest {
    #[serde(default)]
    pub iterations: Vec<DesignRef>,
}

#[derive(Debug, Deserialize)]
pub struct StoryboardRequest {
    #[serde(default)]
    pub storyboard_sequence: Vec<StoryboardFrame>,
}

#[derive(Debug, Deserialize)]
pub struct ComparisonRequest {
    #[serde(default)]
    pub design_ids: Vec<DesignId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DesignData {
    #[serde(default)]
    pub material: MaterialType,
    #[serde(default, alias = "product_type")]
    pub product_category: Option<ProductCategory>,
}

#[derive(Debug, Deserialize)]
pub struct ManufacturabilityRequest {
    #[serde(default)]
    pub design_data: DesignData,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

#[derive(Debug, Deserialize)]
pub struct ParametersRequest {
    pub design_id: DesignId,
    #[serde(default = "empty_object")]
    pub updates: Value,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// `200` with `body`, which should carry `"success": true`.
pub fn success<T: Serialize>(body: &T) -> Response {
    warp::reply::json(body).into_response()
}

/// `200` with `success: false`.
pub fn business_failure(code: &str, message: impl Display) -> Response {
    warp::reply::json(&json!({
        "success": false,
        "error": code,
        "message": message.to_string(),
    }))
    .into_response()
}

pub fn failure_code(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Network => "network",
        FailureKind::Authentication => "authentication",
        FailureKind::RateLimited => "rate_limited",
        FailureKind::InvalidParameters => "invalid_parameters",
        FailureKind::Upstream => "upstream",
        FailureKind::Unconfigured => "unconfigured",
        FailureKind::Storage => "storage",
        FailureKind::Internal => "internal",
    }
}

pub fn provider_failure(err: &ProviderError) -> Response {
    business_failure(failure_code(err.kind()), err)
}

pub fn selection_failure(err: &SelectionError) -> Response {
    match err {
        SelectionError::NoCandidates { .. } => business_failure("no_candidates", err),
    }
}

pub fn comparison_failure(err: &ComparisonError) -> Response {
    let code = match err {
        ComparisonError::TooFewDesigns { .. } => "too_few_designs",
        ComparisonError::UnknownDesign { .. } => "unknown_design",
        ComparisonError::NotRenderable { .. } => "not_renderable",
    };
    business_failure(code, err)
}

/// Orchestration errors: bad parameters are a malformed request, the rest
/// are business failures.
pub fn orchestration_failure(err: &OrchestrationError) -> Result<Response, Rejection> {
    match err {
        OrchestrationError::InvalidParameters(inner) => Err(bad_request(inner)),
        OrchestrationError::InvalidVariantCount { .. } => {
            Ok(business_failure("invalid_variant_count", err))
        }
        OrchestrationError::TimedOut { .. } => Ok(business_failure("timed_out", err)),
    }
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

/// The request parsed as JSON but its content is unusable.
#[derive(Debug)]
pub struct BadRequest(pub String);

impl warp::reject::Reject for BadRequest {}

/// A fault on our side, such as an unwritable output directory.
#[derive(Debug)]
pub struct InternalFault(pub String);

impl warp::reject::Reject for InternalFault {}

pub fn bad_request(message: impl Display) -> Rejection {
    warp::reject::custom(BadRequest(message.to_string()))
}

pub fn internal_fault(message: impl Display) -> Rejection {
    warp::reject::custom(InternalFault(message.to_string()))
}

fn error_reply(status: StatusCode, code: &str, message: &str) -> Response {
    warp::reply::with_status(
        warp::reply::json(&json!({
            "success": false,
            "error": code,
            "message": message,
        })),
        status,
    )
    .into_response()
}

/// Turn every rejection into a JSON error body.
pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let reply = if err.is_not_found() {
        error_reply(StatusCode::NOT_FOUND, "not_found", "no such resource")
    } else if let Some(BadRequest(message)) = err.find::<BadRequest>() {
        error_reply(StatusCode::BAD_REQUEST, "bad_request", message)
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        error_reply(StatusCode::BAD_REQUEST, "bad_request", &e.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        error_reply(
            StatusCode::METHOD_NOT_ALLOWED,
            "method_not_allowed",
            "method not allowed",
        )
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        error_reply(
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload_too_large",
            "request body too large",
        )
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        error_reply(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "unsupported_media_type",
            "expected application/json",
        )
    } else if let Some(InternalFault(message)) = err.find::<InternalFault>() {
        error!(error = %message, "request failed");
        error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "internal server error",
        )
    } else {
        error!(rejection = ?err, "unhandled rejection");
        error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "internal server error",
        )
    };
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn design_refs_accept_ids_and_results() {
        let body: SelectBestRequest = serde_json::from_value(json!({
            "designs": ["20260101_000000_abcd1234"]
        }))
        .unwrap();
        assert!(matches!(&body.designs[0], DesignRef::Id(id) if id.as_str() == "20260101_000000_abcd1234"));

        let result = DesignResult::failed(
            designforge_core::DesignParameters::new("x", ProductCategory::Other),
            &ProviderError::Unconfigured {
                provider: designforge_core::ProviderKind::Fal,
            },
        );
        let body: SelectBestRequest =
            serde_json::from_value(json!({ "designs": [result] })).unwrap();
        assert!(matches!(&body.designs[0], DesignRef::Result(r) if !r.success));
    }

    #[test]
    fn iteration_entries_parse_as_results() {
        let result = DesignResult::failed(
            designforge_core::DesignParameters::new("x", ProductCategory::Other),
            &ProviderError::Unconfigured {
                provider: designforge_core::ProviderKind::Fal,
            },
        );
        let mut entry = serde_json::to_value(&result).unwrap();
        entry["variant_id"] = json!("iteration_1");
        entry["variation_type"] = json!("lighting_studio_fov_47.5");
        let body: SelectIterationRequest =
            serde_json::from_value(json!({ "iterations": [entry] })).unwrap();
        assert!(matches!(&body.iterations[0], DesignRef::Result(r) if r.design_id == result.design_id));
    }

    #[test]
    fn design_data_accepts_product_type_alias() {
        let body: ManufacturabilityRequest = serde_json::from_value(json!({
            "design_data": {"material": "carbon_fiber", "product_type": "car"}
        }))
        .unwrap();
        assert_eq!(body.design_data.material, MaterialType::CarbonFiber);
        assert_eq!(body.design_data.product_category, Some(ProductCategory::Car));
    }

    #[test]
    fn failure_codes_match_wire_names() {
        for kind in [
            FailureKind::Network,
            FailureKind::RateLimited,
            FailureKind::InvalidParameters,
            FailureKind::Unconfigured,
        ] {
            let wire = serde_json::to_value(kind).unwrap();
            assert_eq!(wire, failure_code(kind));
        }
    }
}
