//! Replicate predictions API: create a prediction, then poll it until it
//! reaches a terminal status.

use std::collections::BTreeMap;

use async_trait::async_trait;
use designforge_core::{DesignParameters, GeneratedImage, ImageGenerator, ProviderError, ProviderKind};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::{ProviderSettings, ReplicatePolling};
use crate::fal::FalRequest;
use crate::http::{download_image, expect_status, read_json, transport_error, upstream};

const PROVIDER: ProviderKind = ProviderKind::Replicate;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRequest {
    pub version: String,
    /// Same input shape as the FAL endpoint.
    pub input: FalRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PredictionStatus::Succeeded | PredictionStatus::Failed | PredictionStatus::Canceled
        )
    }
}

/// Replicate returns either a single URL or a list of them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PredictionOutput {
    One(String),
    Many(Vec<String>),
}

impl PredictionOutput {
    pub fn first(self) -> Option<String> {
        match self {
            PredictionOutput::One(url) => Some(url),
            PredictionOutput::Many(urls) => urls.into_iter().next(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Option<PredictionOutput>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub metrics: BTreeMap<String, Value>,
}

impl Prediction {
    /// Image URL and metrics of a terminal prediction.
    pub fn into_image(self) -> Result<(String, BTreeMap<String, Value>), ProviderError> {
        if self.status != PredictionStatus::Succeeded {
            let reason = match &self.error {
                Some(Value::String(message)) => message.clone(),
                Some(other) => other.to_string(),
                None => format!("{:?}", self.status).to_lowercase(),
            };
            return Err(upstream(PROVIDER, format!("prediction {} failed: {reason}", self.id)));
        }
        let url = self
            .output
            .and_then(PredictionOutput::first)
            .ok_or_else(|| upstream(PROVIDER, format!("prediction {} has no output", self.id)))?;
        Ok((url, self.metrics))
    }
}

pub struct ReplicateGenerator {
    http: Client,
    endpoint: String,
    api_token: String,
    polling: ReplicatePolling,
}

impl ReplicateGenerator {
    pub fn new(
        http: Client,
        endpoint: impl Into<String>,
        api_token: impl Into<String>,
        polling: ReplicatePolling,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
            polling,
        }
    }

    pub fn from_settings(
        http: Client,
        settings: &ProviderSettings,
        polling: ReplicatePolling,
    ) -> Option<Self> {
        let key = settings.api_key.as_ref()?;
        Some(Self::new(http, settings.endpoint.clone(), key.clone(), polling))
    }

    fn auth(&self) -> String {
        format!("Token {}", self.api_token)
    }

    async fn create(&self, params: &DesignParameters) -> Result<Prediction, ProviderError> {
        let request = PredictionRequest {
            version: self.polling.model_version.clone(),
            input: FalRequest::from_params(params),
        };
        let response = self
            .http
            .post(&self.endpoint)
            .header("Authorization", self.auth())
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;
        let response = expect_status(PROVIDER, response, |s| s == StatusCode::CREATED).await?;
        read_json(PROVIDER, response).await
    }

    async fn poll(&self, id: &str) -> Result<Prediction, ProviderError> {
        let url = format!("{}/{}", self.endpoint, id);
        for attempt in 1..=self.polling.max_attempts {
            tokio::time::sleep(self.polling.interval).await;
            let response = self
                .http
                .get(&url)
                .header("Authorization", self.auth())
                .send()
                .await
                .map_err(|e| transport_error(PROVIDER, e))?;
            let prediction: Prediction = read_json(PROVIDER, response).await?;
            debug!(prediction = %id, attempt, status = ?prediction.status, "polled prediction");
            if prediction.status.is_terminal() {
                return Ok(prediction);
            }
        }
        Err(upstream(
            PROVIDER,
            format!(
                "prediction {id} did not finish after {} polls",
                self.polling.max_attempts
            ),
        ))
    }
}

#[async_trait]
impl ImageGenerator for ReplicateGenerator {
    fn provider(&self) -> ProviderKind {
        PROVIDER
    }

    #[instrument(skip_all, fields(provider = "replicate"))]
    async fn generate(&self, params: &DesignParameters) -> Result<GeneratedImage, ProviderError> {
        let created = self.create(params).await?;
        let finished = if created.status.is_terminal() {
            created
        } else {
            self.poll(&created.id).await?
        };
        let (url, metadata) = finished.into_image()?;
        let bytes = download_image(&self.http, PROVIDER, &url).await?;

        Ok(GeneratedImage {
            bytes,
            source_url: Some(url),
            metadata,
        })
    }
}
