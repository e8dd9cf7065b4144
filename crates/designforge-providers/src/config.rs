//! Provider configuration
//!
//! Credentials and endpoints come from the environment. A provider without
//! an API key is left unregistered, so requests for it fail as
//! `unconfigured` instead of reaching the network.

use std::time::Duration;

use designforge_core::ProviderKind;

pub const FAL_ENDPOINT: &str = "https://fal.run/fal-ai/bria-fibo";
pub const BRIA_ENDPOINT: &str = "https://engine.prod.bria-api.com/v1/image/generate";
pub const REPLICATE_ENDPOINT: &str = "https://api.replicate.com/v1/predictions";
pub const REPLICATE_VERSION: &str = "bria-fibo-version-id";

/// Credentials and endpoint for one provider.
#[derive(Clone)]
pub struct ProviderSettings {
    pub endpoint: String,
    pub api_key: Option<String>,
}

// Keeps keys out of logs.
impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ProviderSettings {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Replicate prediction polling.
#[derive(Debug, Clone)]
pub struct ReplicatePolling {
    pub model_version: String,
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for ReplicatePolling {
    fn default() -> Self {
        Self {
            model_version: REPLICATE_VERSION.to_string(),
            interval: Duration::from_secs(2),
            max_attempts: 60,
        }
    }
}

/// Configuration for every provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub fal: ProviderSettings,
    pub bria: ProviderSettings,
    pub replicate: ProviderSettings,
    pub replicate_polling: ReplicatePolling,
    /// Per-request timeout for provider HTTP calls.
    pub request_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            fal: ProviderSettings::new(FAL_ENDPOINT),
            bria: ProviderSettings::new(BRIA_ENDPOINT),
            replicate: ProviderSettings::new(REPLICATE_ENDPOINT),
            replicate_polling: ReplicatePolling::default(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl ProviderConfig {
    /// Read configuration from process environment variables.
    ///
    /// Keys: `FAL_API_KEY`, `BRIA_API_KEY`, `REPLICATE_API_KEY`.
    /// Optional overrides: `FAL_FIBO_ENDPOINT`, `BRIA_API_ENDPOINT`,
    /// `REPLICATE_API_ENDPOINT`, `REPLICATE_MODEL_VERSION`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`ProviderConfig::from_env`] but reads through `lookup`. Empty
    /// values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let settings = |endpoint_var: &str, default: &str, key_var: &str| ProviderSettings {
            endpoint: get(endpoint_var).unwrap_or_else(|| default.to_string()),
            api_key: get(key_var),
        };

        let mut config = Self {
            fal: settings("FAL_FIBO_ENDPOINT", FAL_ENDPOINT, "FAL_API_KEY"),
            bria: settings("BRIA_API_ENDPOINT", BRIA_ENDPOINT, "BRIA_API_KEY"),
            replicate: settings("REPLICATE_API_ENDPOINT", REPLICATE_ENDPOINT, "REPLICATE_API_KEY"),
            ..Self::default()
        };
        if let Some(version) = get("REPLICATE_MODEL_VERSION") {
            config.replicate_polling.model_version = version;
        }
        config
    }

    pub fn settings(&self, provider: ProviderKind) -> &ProviderSettings {
        match provider {
            ProviderKind::Fal => &self.fal,
            ProviderKind::Bria => &self.bria,
            ProviderKind::Replicate => &self.replicate,
        }
    }

    /// Providers that have an API key, in stable order.
    pub fn configured(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|p| self.settings(*p).is_configured())
            .collect()
    }
}
