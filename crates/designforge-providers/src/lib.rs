//! HTTP implementations of the DesignForge image-generation seam.
//!
//! Each provider implements [`designforge_core::ImageGenerator`]. Use
//! [`build_generation_client`] to wire every provider that has credentials
//! into a [`GenerationClient`].

pub mod bria;
pub mod config;
pub mod fal;
pub mod http;
pub mod replicate;

use std::sync::Arc;

use designforge_core::{GenerationClient, ImageStore, ProviderKind};
use thiserror::Error;
use tracing::{info, warn};

pub use bria::BriaGenerator;
pub use config::{ProviderConfig, ProviderSettings, ReplicatePolling};
pub use fal::FalGenerator;
pub use replicate::ReplicateGenerator;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Build a [`GenerationClient`] with every provider that has an API key.
///
/// Providers without a key are skipped with a warning; requests for them
/// fail as `unconfigured`.
pub fn build_generation_client(
    config: &ProviderConfig,
    store: Arc<dyn ImageStore>,
) -> Result<GenerationClient, SetupError> {
    let http = http::build_client(config.request_timeout)?;
    let mut client = GenerationClient::new(store);

    if let Some(fal) = FalGenerator::from_settings(http.clone(), &config.fal) {
        client.register(Arc::new(fal));
    }
    if let Some(bria) = BriaGenerator::from_settings(http.clone(), &config.bria) {
        client.register(Arc::new(bria));
    }
    if let Some(replicate) = ReplicateGenerator::from_settings(
        http,
        &config.replicate,
        config.replicate_polling.clone(),
    ) {
        client.register(Arc::new(replicate));
    }

    for provider in ProviderKind::ALL {
        if !config.settings(provider).is_configured() {
            warn!(provider = %provider, "no API key configured, provider disabled");
        }
    }
    info!(providers = ?client.providers(), "generation client ready");
    Ok(client)
}
