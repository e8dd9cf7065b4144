//! Design identifiers and generation results.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{FailureKind, ProviderError};
use super::params::DesignParameters;

/// Identifier of a generated design: `YYYYMMDD_HHMMSS_<8 hex chars>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DesignId(String);

impl DesignId {
    /// Generate a fresh, time-prefixed identifier.
    pub fn generate() -> Self {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        DesignId(format!("{stamp}_{}", &suffix[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for DesignId {
    fn from(value: String) -> Self {
        DesignId(value)
    }
}

impl From<&str> for DesignId {
    fn from(value: &str) -> Self {
        DesignId(value.to_string())
    }
}

impl fmt::Display for DesignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a persisted image lives, locally and for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    pub path: PathBuf,
    pub url: String,
    /// Hex SHA-256 of the stored bytes.
    pub sha256: String,
    pub size_bytes: u64,
}

/// Why a generation call failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Outcome of one Generation Client call.
///
/// Created when the call settles and never mutated afterwards; downstream
/// structures hold it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignResult {
    pub design_id: DesignId,
    pub parameters: DesignParameters,
    #[serde(default)]
    pub image_reference: Option<ImageReference>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub success: bool,
    #[serde(default)]
    pub failure: Option<GenerationFailure>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl DesignResult {
    /// A successful result pointing at a persisted image.
    pub fn succeeded(
        design_id: DesignId,
        parameters: DesignParameters,
        image: ImageReference,
        metadata: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            design_id,
            parameters,
            image_reference: Some(image),
            metadata,
            success: true,
            failure: None,
            created_at: Utc::now(),
        }
    }

    /// A failed result recording the provider error.
    pub fn failed(parameters: DesignParameters, error: &ProviderError) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(
            "provider".to_string(),
            serde_json::Value::String(parameters.provider().as_str().to_string()),
        );
        Self {
            design_id: DesignId::generate(),
            parameters,
            image_reference: None,
            metadata,
            success: false,
            failure: Some(GenerationFailure {
                kind: error.kind(),
                message: error.to_string(),
            }),
            created_at: Utc::now(),
        }
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_reference.as_ref().map(|image| image.url.as_str())
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure.as_ref().map(|f| f.kind)
    }
}
