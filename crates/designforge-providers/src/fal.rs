//! FAL.AI hosted FIBO endpoint. Synchronous mode: the response already
//! carries the image URL.

use std::collections::BTreeMap;

use async_trait::async_trait;
use designforge_core::{DesignParameters, GeneratedImage, ImageGenerator, ProviderError, ProviderKind};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::config::ProviderSettings;
use crate::http::{download_image, read_json, transport_error, upstream};

const PROVIDER: ProviderKind = ProviderKind::Fal;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FalRequest {
    pub prompt: String,
    pub image_size: ImageSize,
    pub num_images: u32,
    pub sync_mode: bool,
    pub enable_safety_checks: bool,
    pub output_format: String,
    pub expand_prompt: bool,
}

impl FalRequest {
    pub fn from_params(params: &DesignParameters) -> Self {
        Self {
            prompt: params.prompt().to_string(),
            image_size: ImageSize {
                width: params.width(),
                height: params.height(),
            },
            num_images: 1,
            sync_mode: true,
            enable_safety_checks: true,
            output_format: "png".to_string(),
            expand_prompt: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FalImage {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FalResponse {
    #[serde(default)]
    pub images: Vec<FalImage>,
}

impl FalResponse {
    /// URL of the first image plus its reported dimensions.
    pub fn into_first_image(self) -> Result<(String, BTreeMap<String, Value>), ProviderError> {
        let image = self
            .images
            .into_iter()
            .next()
            .ok_or_else(|| upstream(PROVIDER, "no images returned"))?;

        let mut metadata = BTreeMap::new();
        if let Some(width) = image.width {
            metadata.insert("width".to_string(), Value::from(width));
        }
        if let Some(height) = image.height {
            metadata.insert("height".to_string(), Value::from(height));
        }
        if let Some(content_type) = image.content_type {
            metadata.insert("content_type".to_string(), Value::from(content_type));
        }
        Ok((image.url, metadata))
    }
}

pub struct FalGenerator {
    http: Client,
    endpoint: String,
    api_key: String,
}

impl FalGenerator {
    pub fn new(http: Client, endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }

    /// `None` when the settings carry no API key.
    pub fn from_settings(http: Client, settings: &ProviderSettings) -> Option<Self> {
        let key = settings.api_key.as_ref()?;
        Some(Self::new(http, settings.endpoint.clone(), key.clone()))
    }
}

#[async_trait]
impl ImageGenerator for FalGenerator {
    fn provider(&self) -> ProviderKind {
        PROVIDER
    }

    #[instrument(skip_all, fields(provider = "fal"))]
    async fn generate(&self, params: &DesignParameters) -> Result<GeneratedImage, ProviderError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("Key {}", self.api_key))
            .json(&FalRequest::from_params(params))
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let body: FalResponse = read_json(PROVIDER, response).await?;
        let (url, metadata) = body.into_first_image()?;
        let bytes = download_image(&self.http, PROVIDER, &url).await?;

        Ok(GeneratedImage {
            bytes,
            source_url: Some(url),
            metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use designforge_core::ProductCategory;

    #[test]
    fn request_body_shape() {
        let params = DesignParameters::new("titanium watch", ProductCategory::Other).with_resolution(1536, 1024);
        let body = serde_json::to_value(FalRequest::from_params(&params)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "prompt": "titanium watch",
                "image_size": {"width": 1536, "height": 1024},
                "num_images": 1,
                "sync_mode": true,
                "enable_safety_checks": true,
                "output_format": "png",
                "expand_prompt": true
            })
        );
    }

    #[test]
    fn first_image_and_metadata() {
        let response: FalResponse = serde_json::from_value(serde_json::json!({
            "images": [
                {"url": "https://cdn.example/a.png", "width": 1024, "height": 768, "content_type": "image/png"},
                {"url": "https://cdn.example/b.png"}
            ]
        }))
        .unwrap();
        let (url, metadata) = response.into_first_image().unwrap();
        assert_eq!(url, "https://cdn.example/a.png");
        assert_eq!(metadata["width"], 1024);
        assert_eq!(metadata["content_type"], "image/png");
    }

    #[test]
    fn empty_images_is_upstream_failure() {
        let response: FalResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        let err = response.into_first_image().unwrap_err();
        assert_eq!(err.kind(), designforge_core::FailureKind::Upstream);
    }
}
