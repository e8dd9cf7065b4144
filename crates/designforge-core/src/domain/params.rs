//! Design generation parameters and their categorical vocabularies.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use super::error::DesignError;

/// Camera placement used when rendering a product shot.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CameraAngle {
    Front,
    Side,
    #[default]
    ThreeQuarter,
    Top,
    Isometric,
    LowAngle,
    HighAngle,
}

impl CameraAngle {
    pub const ALL: [CameraAngle; 7] = [
        CameraAngle::Front,
        CameraAngle::Side,
        CameraAngle::ThreeQuarter,
        CameraAngle::Top,
        CameraAngle::Isometric,
        CameraAngle::LowAngle,
        CameraAngle::HighAngle,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CameraAngle::Front => "front",
            CameraAngle::Side => "side",
            CameraAngle::ThreeQuarter => "three_quarter",
            CameraAngle::Top => "top",
            CameraAngle::Isometric => "isometric",
            CameraAngle::LowAngle => "low_angle",
            CameraAngle::HighAngle => "high_angle",
        }
    }
}

impl fmt::Display for CameraAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Studio lighting preset.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LightingSetup {
    #[default]
    Studio,
    Natural,
    Dramatic,
    Soft,
    Hdr,
    Product,
}

impl LightingSetup {
    pub const ALL: [LightingSetup; 6] = [
        LightingSetup::Studio,
        LightingSetup::Natural,
        LightingSetup::Dramatic,
        LightingSetup::Soft,
        LightingSetup::Hdr,
        LightingSetup::Product,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LightingSetup::Studio => "studio",
            LightingSetup::Natural => "natural",
            LightingSetup::Dramatic => "dramatic",
            LightingSetup::Soft => "soft",
            LightingSetup::Hdr => "hdr",
            LightingSetup::Product => "product",
        }
    }
}

impl fmt::Display for LightingSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Surface material of the rendered product.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MaterialType {
    #[default]
    Metal,
    Plastic,
    Glass,
    CarbonFiber,
    Leather,
    Fabric,
    Rubber,
}

impl MaterialType {
    pub fn as_str(self) -> &'static str {
        match self {
            MaterialType::Metal => "metal",
            MaterialType::Plastic => "plastic",
            MaterialType::Glass => "glass",
            MaterialType::CarbonFiber => "carbon_fiber",
            MaterialType::Leather => "leather",
            MaterialType::Fabric => "fabric",
            MaterialType::Rubber => "rubber",
        }
    }
}

impl fmt::Display for MaterialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad product family. Unrecognised categories collapse to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Car,
    Electronics,
    Appliance,
    #[serde(other)]
    Other,
}

impl ProductCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductCategory::Car => "car",
            ProductCategory::Electronics => "electronics",
            ProductCategory::Appliance => "appliance",
            ProductCategory::Other => "other",
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External image-generation service a request is dispatched to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Fal,
    Bria,
    Replicate,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [ProviderKind::Fal, ProviderKind::Bria, ProviderKind::Replicate];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Fal => "fal",
            ProviderKind::Bria => "bria",
            ProviderKind::Replicate => "replicate",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DEFAULT_FOV: f64 = 50.0;
pub const DEFAULT_REFLECTIVITY: f64 = 0.8;
pub const DEFAULT_TEXTURE_QUALITY: f64 = 0.9;
pub const DEFAULT_DIMENSION: u32 = 1024;
pub const DEFAULT_BIT_DEPTH: u8 = 16;
pub const DEFAULT_PALETTE: [&str; 3] = ["#1a1a1a", "#ffffff", "#c0c0c0"];

pub const MIN_DIMENSION: u32 = 512;
pub const MAX_DIMENSION: u32 = 2048;
pub const MIN_FOV: f64 = 10.0;
pub const MAX_FOV: f64 = 120.0;

/// Immutable record of everything a single generation call needs.
///
/// # Invariants
///
/// - `reflectivity` and `texture_quality` always lie in `[0, 1]`; out-of-range
///   inputs are clamped both by the builders and during deserialization.
/// - `width` and `height` are positive. Deserialization rejects zero, the
///   builder clamps to 1. The narrower dashboard range (512..=2048) is checked
///   by [`DesignParameters::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignParameters {
    prompt: String,
    #[serde(alias = "product_type")]
    product_category: ProductCategory,
    #[serde(default)]
    camera_angle: CameraAngle,
    #[serde(default)]
    lighting: LightingSetup,
    #[serde(default)]
    material: MaterialType,
    #[serde(default = "default_fov")]
    fov: f64,
    #[serde(default = "default_reflectivity", deserialize_with = "unit_interval")]
    reflectivity: f64,
    #[serde(default = "default_texture_quality", deserialize_with = "unit_interval")]
    texture_quality: f64,
    #[serde(default = "default_palette")]
    color_palette: Vec<String>,
    #[serde(default = "default_composition")]
    composition_focus: String,
    #[serde(default = "default_background")]
    background: String,
    #[serde(default = "default_dimension", deserialize_with = "positive_dimension")]
    width: u32,
    #[serde(default = "default_dimension", deserialize_with = "positive_dimension")]
    height: u32,
    #[serde(default = "default_true")]
    hdr_enabled: bool,
    #[serde(default = "default_bit_depth")]
    bit_depth: u8,
    #[serde(default, alias = "api_provider")]
    provider: ProviderKind,
}

fn default_fov() -> f64 {
    DEFAULT_FOV
}

fn default_reflectivity() -> f64 {
    DEFAULT_REFLECTIVITY
}

fn default_texture_quality() -> f64 {
    DEFAULT_TEXTURE_QUALITY
}

fn default_palette() -> Vec<String> {
    DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect()
}

fn default_composition() -> String {
    "centered".to_string()
}

fn default_background() -> String {
    "studio_white".to_string()
}

fn default_dimension() -> u32 {
    DEFAULT_DIMENSION
}

fn default_true() -> bool {
    true
}

fn default_bit_depth() -> u8 {
    DEFAULT_BIT_DEPTH
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn unit_interval<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(clamp_unit)
}

fn positive_dimension<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = u32::deserialize(deserializer)?;
    if value == 0 {
        return Err(serde::de::Error::custom("dimension must be a positive integer"));
    }
    Ok(value)
}

impl DesignParameters {
    /// Parameters for `prompt` with the dashboard defaults for everything else.
    pub fn new(prompt: impl Into<String>, product_category: ProductCategory) -> Self {
        Self {
            prompt: prompt.into(),
            product_category,
            camera_angle: CameraAngle::default(),
            lighting: LightingSetup::default(),
            material: MaterialType::default(),
            fov: DEFAULT_FOV,
            reflectivity: DEFAULT_REFLECTIVITY,
            texture_quality: DEFAULT_TEXTURE_QUALITY,
            color_palette: default_palette(),
            composition_focus: default_composition(),
            background: default_background(),
            width: DEFAULT_DIMENSION,
            height: DEFAULT_DIMENSION,
            hdr_enabled: true,
            bit_depth: DEFAULT_BIT_DEPTH,
            provider: ProviderKind::default(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_camera_angle(mut self, camera_angle: CameraAngle) -> Self {
        self.camera_angle = camera_angle;
        self
    }

    pub fn with_lighting(mut self, lighting: LightingSetup) -> Self {
        self.lighting = lighting;
        self
    }

    pub fn with_material(mut self, material: MaterialType) -> Self {
        self.material = material;
        self
    }

    pub fn with_fov(mut self, fov: f64) -> Self {
        self.fov = fov;
        self
    }

    /// Set reflectivity, clamped into `[0, 1]`.
    pub fn with_reflectivity(mut self, reflectivity: f64) -> Self {
        self.reflectivity = clamp_unit(reflectivity);
        self
    }

    /// Set texture quality, clamped into `[0, 1]`.
    pub fn with_texture_quality(mut self, texture_quality: f64) -> Self {
        self.texture_quality = clamp_unit(texture_quality);
        self
    }

    pub fn with_color_palette<I, S>(mut self, palette: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.color_palette = palette.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_composition_focus(mut self, focus: impl Into<String>) -> Self {
        self.composition_focus = focus.into();
        self
    }

    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = background.into();
        self
    }

    /// Set the output resolution. Zero dimensions are raised to 1.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width.max(1);
        self.height = height.max(1);
        self
    }

    pub fn with_hdr(mut self, hdr_enabled: bool, bit_depth: u8) -> Self {
        self.hdr_enabled = hdr_enabled;
        self.bit_depth = bit_depth;
        self
    }

    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = provider;
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn product_category(&self) -> ProductCategory {
        self.product_category
    }

    pub fn camera_angle(&self) -> CameraAngle {
        self.camera_angle
    }

    pub fn lighting(&self) -> LightingSetup {
        self.lighting
    }

    pub fn material(&self) -> MaterialType {
        self.material
    }

    pub fn fov(&self) -> f64 {
        self.fov
    }

    pub fn reflectivity(&self) -> f64 {
        self.reflectivity
    }

    pub fn texture_quality(&self) -> f64 {
        self.texture_quality
    }

    pub fn color_palette(&self) -> &[String] {
        &self.color_palette
    }

    pub fn composition_focus(&self) -> &str {
        &self.composition_focus
    }

    pub fn background(&self) -> &str {
        &self.background
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn hdr_enabled(&self) -> bool {
        self.hdr_enabled
    }

    pub fn bit_depth(&self) -> u8 {
        self.bit_depth
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// Check the parameters against the dashboard schema.
    ///
    /// # Errors
    ///
    /// Returns [`DesignError::InvalidParameter`] naming the first offending field.
    pub fn validate(&self) -> Result<(), DesignError> {
        if self.prompt.trim().is_empty() {
            return Err(DesignError::invalid("prompt", "must not be empty"));
        }
        for (field, value) in [("width", self.width), ("height", self.height)] {
            if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
                return Err(DesignError::invalid(
                    field,
                    format!("must be between {MIN_DIMENSION} and {MAX_DIMENSION} pixels, got {value}"),
                ));
            }
        }
        if !(MIN_FOV..=MAX_FOV).contains(&self.fov) {
            return Err(DesignError::invalid(
                "fov",
                format!("must be between {MIN_FOV} and {MAX_FOV} degrees, got {}", self.fov),
            ));
        }
        if self.bit_depth != 8 && self.bit_depth != 16 {
            return Err(DesignError::invalid(
                "bit_depth",
                format!("must be 8 or 16, got {}", self.bit_depth),
            ));
        }
        Ok(())
    }

    /// Human-facing parameter table shown next to a rendered design.
    pub fn display_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("Camera".to_string(), title_case(self.camera_angle.as_str()));
        params.insert("Field of View".to_string(), format!("{:.1}°", self.fov));
        params.insert("Lighting".to_string(), title_case(self.lighting.as_str()));
        params.insert("Material".to_string(), title_case(self.material.as_str()));
        params.insert(
            "Reflectivity".to_string(),
            format!("{:.0}%", self.reflectivity * 100.0),
        );
        params.insert(
            "Texture Quality".to_string(),
            format!("{:.0}%", self.texture_quality * 100.0),
        );
        params.insert(
            "Resolution".to_string(),
            format!("{}x{}", self.width, self.height),
        );
        params.insert("Color Depth".to_string(), format!("{}-bit", self.bit_depth));
        params.insert(
            "HDR".to_string(),
            if self.hdr_enabled { "Enabled" } else { "Disabled" }.to_string(),
        );
        if !self.color_palette.is_empty() {
            params.insert("Color Palette".to_string(), self.color_palette.join(", "));
        }
        params
    }
}

fn title_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
