//! Domain-level error taxonomy for DesignForge.

use serde::{Deserialize, Serialize};

use super::params::ProviderKind;

/// Errors produced by design parameter validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DesignError {
    #[error("invalid parameter {field}: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    #[error("malformed design parameters: {0}")]
    Malformed(String),
}

impl DesignError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        DesignError::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }
}

/// Coarse classification of a failed generation call, recorded on failed
/// results and used for consistency recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Network,
    Authentication,
    RateLimited,
    InvalidParameters,
    Upstream,
    Unconfigured,
    Storage,
    Internal,
}

impl FailureKind {
    /// Failures that point at credentials rather than the request itself.
    pub fn is_credential_related(self) -> bool {
        matches!(self, FailureKind::Authentication | FailureKind::Unconfigured)
    }
}

/// Failure of a single call to an external image-generation service.
///
/// Surfaced per slot by the variant orchestrator; never aborts sibling slots.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("network failure talking to {provider}: {message}")]
    Network {
        provider: ProviderKind,
        message: String,
    },

    #[error("{provider} rejected the credentials: {message}")]
    Authentication {
        provider: ProviderKind,
        message: String,
    },

    #[error("{provider} rate limit exceeded: {message}")]
    RateLimited {
        provider: ProviderKind,
        message: String,
    },

    #[error("{provider} rejected the parameters: {message}")]
    InvalidParameters {
        provider: ProviderKind,
        message: String,
    },

    #[error("{provider} returned an unusable response: {message}")]
    Upstream {
        provider: ProviderKind,
        message: String,
    },

    #[error("no API key configured for {provider}")]
    Unconfigured { provider: ProviderKind },

    #[error("failed to persist generated image: {message}")]
    Storage { message: String },

    #[error("generation task failed: {message}")]
    Internal { message: String },
}

impl ProviderError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ProviderError::Network { .. } => FailureKind::Network,
            ProviderError::Authentication { .. } => FailureKind::Authentication,
            ProviderError::RateLimited { .. } => FailureKind::RateLimited,
            ProviderError::InvalidParameters { .. } => FailureKind::InvalidParameters,
            ProviderError::Upstream { .. } => FailureKind::Upstream,
            ProviderError::Unconfigured { .. } => FailureKind::Unconfigured,
            ProviderError::Storage { .. } => FailureKind::Storage,
            ProviderError::Internal { .. } => FailureKind::Internal,
        }
    }

    /// Build a provider error of `kind`. Kinds without a provider field ignore it.
    pub fn from_kind(kind: FailureKind, provider: ProviderKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            FailureKind::Network => ProviderError::Network { provider, message },
            FailureKind::Authentication => ProviderError::Authentication { provider, message },
            FailureKind::RateLimited => ProviderError::RateLimited { provider, message },
            FailureKind::InvalidParameters => ProviderError::InvalidParameters { provider, message },
            FailureKind::Upstream => ProviderError::Upstream { provider, message },
            FailureKind::Unconfigured => ProviderError::Unconfigured { provider },
            FailureKind::Storage => ProviderError::Storage { message },
            FailureKind::Internal => ProviderError::Internal { message },
        }
    }
}
