//! Parameter intake: turn a loosely structured request into validated
//! [`DesignParameters`].
//!
//! A request that names a prompt and a product category but no camera angle
//! is treated as natural language: attributes are inferred from keywords in
//! the prompt, then any explicit fields in the request are merged on top.

use serde_json::{Map, Value};

use crate::domain::{
    CameraAngle, DesignError, DesignParameters, LightingSetup, MaterialType, ProductCategory,
};

const MATTE_REFLECTIVITY: f64 = 0.3;
const GLOSSY_REFLECTIVITY: f64 = 0.95;

fn mentions(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

/// Infer parameters from keywords in `prompt`, then apply category presets.
///
/// Presets win over keywords: cars are always shot three-quarter with a
/// narrow lens, electronics isometric under product lighting.
pub fn infer_parameters(prompt: &str, category: ProductCategory) -> DesignParameters {
    let text = prompt.to_lowercase();
    let mut params = DesignParameters::new(prompt, category);

    let camera = if mentions(&text, &["front view", "from front"]) {
        Some(CameraAngle::Front)
    } else if mentions(&text, &["side view", "from side"]) {
        Some(CameraAngle::Side)
    } else if mentions(&text, &["top view", "from above"]) {
        Some(CameraAngle::Top)
    } else if text.contains("isometric") {
        Some(CameraAngle::Isometric)
    } else {
        None
    };
    if let Some(camera) = camera {
        params = params.with_camera_angle(camera);
    }

    let lighting = if mentions(&text, &["dramatic", "moody"]) {
        Some(LightingSetup::Dramatic)
    } else if mentions(&text, &["natural", "daylight"]) {
        Some(LightingSetup::Natural)
    } else if text.contains("soft") {
        Some(LightingSetup::Soft)
    } else {
        None
    };
    if let Some(lighting) = lighting {
        params = params.with_lighting(lighting);
    }

    let material = if text.contains("plastic") {
        Some(MaterialType::Plastic)
    } else if text.contains("glass") {
        Some(MaterialType::Glass)
    } else if text.contains("carbon") {
        Some(MaterialType::CarbonFiber)
    } else if text.contains("leather") {
        Some(MaterialType::Leather)
    } else {
        None
    };
    if let Some(material) = material {
        params = params.with_material(material);
    }

    // "non-reflective" must be checked before "reflective".
    if mentions(&text, &["matte", "non-reflective"]) {
        params = params.with_reflectivity(MATTE_REFLECTIVITY);
    } else if mentions(&text, &["glossy", "shiny", "reflective"]) {
        params = params.with_reflectivity(GLOSSY_REFLECTIVITY);
    }

    if text.contains("black") && text.contains("white") {
        params = params.with_color_palette(["#000000", "#ffffff", "#808080"]);
    } else if text.contains("red") {
        params = params.with_color_palette(["#cc0000", "#ffffff", "#333333"]);
    } else if text.contains("blue") {
        params = params.with_color_palette(["#0066cc", "#ffffff", "#333333"]);
    }

    match category {
        ProductCategory::Car => params
            .with_camera_angle(CameraAngle::ThreeQuarter)
            .with_fov(35.0)
            .with_composition_focus("dynamic"),
        ProductCategory::Electronics => params
            .with_camera_angle(CameraAngle::Isometric)
            .with_lighting(LightingSetup::Product)
            .with_background("gradient"),
        _ => params,
    }
}

/// Merge `updates` into `base`. Nested objects merge key by key; any other
/// value replaces what was there.
pub fn merge_json(base: &mut Value, updates: Value) {
    match (base, updates) {
        (Value::Object(base), Value::Object(updates)) => {
            for (key, value) in updates {
                match base.get_mut(&key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge_json(existing, value)
                    }
                    _ => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, updates) => *base = updates,
    }
}

/// Rewrite legacy field names to their canonical form.
fn normalize_aliases(fields: &mut Map<String, Value>) {
    for (alias, canonical) in [("product_type", "product_category"), ("api_provider", "provider")] {
        if let Some(value) = fields.remove(alias) {
            fields.entry(canonical.to_string()).or_insert(value);
        }
    }
}

fn parse_category(value: &Value) -> ProductCategory {
    serde_json::from_value(value.clone()).unwrap_or(ProductCategory::Other)
}

/// Build validated parameters from a request body.
///
/// # Errors
///
/// - [`DesignError::Malformed`] when the body is not an object, lacks a
///   prompt or product category, or has fields of the wrong type.
/// - [`DesignError::InvalidParameter`] when the result fails validation.
pub fn resolve_request(request: Value) -> Result<DesignParameters, DesignError> {
    let Value::Object(mut fields) = request else {
        return Err(DesignError::Malformed("expected a JSON object".to_string()));
    };
    normalize_aliases(&mut fields);

    let prompt = fields.get("prompt").and_then(Value::as_str);
    let category = fields.get("product_category");
    let (Some(prompt), Some(category)) = (prompt, category) else {
        return Err(DesignError::Malformed(
            "missing required fields: prompt and product_type".to_string(),
        ));
    };

    let resolved = if fields.contains_key("camera_angle") {
        Value::Object(fields)
    } else {
        let inferred = infer_parameters(prompt, parse_category(category));
        let mut base = serde_json::to_value(inferred)
            .map_err(|e| DesignError::Malformed(e.to_string()))?;
        merge_json(&mut base, Value::Object(fields));
        base
    };

    let params: DesignParameters =
        serde_json::from_value(resolved).map_err(|e| DesignError::Malformed(e.to_string()))?;
    params.validate()?;
    Ok(params)
}

/// Apply partial `updates` to existing parameters and revalidate.
pub fn apply_updates(
    params: &DesignParameters,
    mut updates: Value,
) -> Result<DesignParameters, DesignError> {
    if let Value::Object(fields) = &mut updates {
        normalize_aliases(fields);
    } else {
        return Err(DesignError::Malformed("updates must be a JSON object".to_string()));
    }
    let mut current =
        serde_json::to_value(params).map_err(|e| DesignError::Malformed(e.to_string()))?;
    merge_json(&mut current, updates);
    let merged: DesignParameters =
        serde_json::from_value(current).map_err(|e| DesignError::Malformed(e.to_string()))?;
    merged.validate()?;
    Ok(merged)
}
