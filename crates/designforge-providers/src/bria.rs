//! Bria.ai direct image generation API.

use std::collections::BTreeMap;

use async_trait::async_trait;
use designforge_core::{DesignParameters, GeneratedImage, ImageGenerator, ProviderError, ProviderKind};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::config::ProviderSettings;
use crate::http::{download_image, read_json, transport_error, upstream};

const PROVIDER: ProviderKind = ProviderKind::Bria;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BriaRequest {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub num_results: u32,
    pub guidance_scale: f64,
    pub num_inference_steps: u32,
    /// Serialized as `null` to let the service pick one.
    pub seed: Option<u64>,
}

impl BriaRequest {
    pub fn from_params(params: &DesignParameters) -> Self {
        Self {
            prompt: params.prompt().to_string(),
            width: params.width(),
            height: params.height(),
            num_results: 1,
            guidance_scale: 7.5,
            num_inference_steps: 50,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BriaResult {
    #[serde(default)]
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BriaResponse {
    #[serde(default)]
    pub result: Vec<BriaResult>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl BriaResponse {
    pub fn into_first_image(self) -> Result<(String, BTreeMap<String, Value>), ProviderError> {
        let url = self
            .result
            .into_iter()
            .next()
            .and_then(|r| r.urls.into_iter().next())
            .ok_or_else(|| upstream(PROVIDER, "no images returned"))?;
        Ok((url, self.metadata))
    }
}

pub struct BriaGenerator {
    http: Client,
    endpoint: String,
    api_token: String,
}

impl BriaGenerator {
    pub fn new(http: Client, endpoint: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            api_token: api_token.into(),
        }
    }

    pub fn from_settings(http: Client, settings: &ProviderSettings) -> Option<Self> {
        let key = settings.api_key.as_ref()?;
        Some(Self::new(http, settings.endpoint.clone(), key.clone()))
    }
}

#[async_trait]
impl ImageGenerator for BriaGenerator {
    fn provider(&self) -> ProviderKind {
        PROVIDER
    }

    #[instrument(skip_all, fields(provider = "bria"))]
    async fn generate(&self, params: &DesignParameters) -> Result<GeneratedImage, ProviderError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("api_token", &self.api_token)
            .json(&BriaRequest::from_params(params))
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let body: BriaResponse = read_json(PROVIDER, response).await?;
        let (url, metadata) = body.into_first_image()?;
        let bytes = download_image(&self.http, PROVIDER, &url).await?;

        Ok(GeneratedImage {
            bytes,
            source_url: Some(url),
            metadata,
        })
    }
}
