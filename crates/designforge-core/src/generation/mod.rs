//! Generation Client: one call to an external image-generation service.
//!
//! The provider-specific HTTP work sits behind [`ImageGenerator`]; the
//! [`GenerationClient`] routes a request to the selected provider, persists
//! the returned bytes through an [`ImageStore`] and hands back a
//! [`DesignResult`] that carries a reference to the image, never the bytes.
//!
//! No retries happen here. Retrying is the caller's decision.

pub mod store;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::domain::{DesignId, DesignParameters, DesignResult, ProviderError, ProviderKind};
use crate::metrics::METRICS;

pub use store::{FsImageStore, ImageStore, StoreError};

/// Raw output of a provider call, before persistence.
#[derive(Debug, Clone, Default)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    /// URL the provider served the image from, when it has one.
    pub source_url: Option<String>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Black-box image-generation capability.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    fn provider(&self) -> ProviderKind;

    async fn generate(&self, params: &DesignParameters) -> Result<GeneratedImage, ProviderError>;
}

/// Which file family a persisted image belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Design,
    Variant,
    Iteration,
}

impl ImageKind {
    pub fn prefix(self) -> &'static str {
        match self {
            ImageKind::Design => "design",
            ImageKind::Variant => "variant",
            ImageKind::Iteration => "iteration",
        }
    }

    pub fn file_name(self, id: &DesignId) -> String {
        format!("{}_{}.png", self.prefix(), id)
    }
}

/// Routes generation requests to registered providers and persists results.
pub struct GenerationClient {
    generators: HashMap<ProviderKind, Arc<dyn ImageGenerator>>,
    store: Arc<dyn ImageStore>,
}

impl GenerationClient {
    pub fn new(store: Arc<dyn ImageStore>) -> Self {
        Self {
            generators: HashMap::new(),
            store,
        }
    }

    /// Register `generator` under the provider it reports. Replaces any
    /// generator already registered for that provider.
    pub fn with_generator(mut self, generator: Arc<dyn ImageGenerator>) -> Self {
        self.register(generator);
        self
    }

    pub fn register(&mut self, generator: Arc<dyn ImageGenerator>) {
        let provider = generator.provider();
        if self.generators.insert(provider, generator).is_some() {
            warn!(provider = %provider, "replacing registered image generator");
        }
    }

    /// Providers that can currently serve requests, in stable order.
    pub fn providers(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|p| self.generators.contains_key(p))
            .collect()
    }

    /// Generate one image with `provider` and persist it as `kind`.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::Unconfigured`] when no generator is registered for `provider`.
    /// - Whatever the provider reports (network, auth, rate limit, invalid parameters).
    /// - [`ProviderError::Storage`] when the image cannot be written.
    #[instrument(skip(self, params), fields(provider = %provider))]
    pub async fn generate(
        &self,
        provider: ProviderKind,
        params: &DesignParameters,
        kind: ImageKind,
    ) -> Result<DesignResult, ProviderError> {
        let outcome = self.generate_inner(provider, params, kind).await;
        match &outcome {
            Ok(result) => {
                METRICS.inc_generations_succeeded();
                debug!(design_id = %result.design_id, "generation succeeded");
            }
            Err(err) => {
                METRICS.inc_generations_failed();
                warn!(error = %err, kind = ?err.kind(), "generation failed");
            }
        }
        outcome
    }

    async fn generate_inner(
        &self,
        provider: ProviderKind,
        params: &DesignParameters,
        kind: ImageKind,
    ) -> Result<DesignResult, ProviderError> {
        let generator = self
            .generators
            .get(&provider)
            .ok_or(ProviderError::Unconfigured { provider })?;

        let image = generator.generate(params).await?;

        let design_id = DesignId::generate();
        let file_name = kind.file_name(&design_id);
        let store = Arc::clone(&self.store);
        let bytes = image.bytes;
        let reference = tokio::task::spawn_blocking(move || store.put(&file_name, &bytes))
            .await
            .map_err(|e| ProviderError::Storage {
                message: e.to_string(),
            })?
            .map_err(|e| ProviderError::Storage {
                message: e.to_string(),
            })?;

        let mut metadata = image.metadata;
        metadata.insert(
            "provider".to_string(),
            serde_json::Value::String(provider.as_str().to_string()),
        );
        if let Some(url) = image.source_url {
            metadata.insert("source_url".to_string(), serde_json::Value::String(url));
        }

        Ok(DesignResult::succeeded(
            design_id,
            params.clone(),
            reference,
            metadata,
        ))
    }
}
