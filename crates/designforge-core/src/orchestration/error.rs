use thiserror::Error;
use uuid::Uuid;

use crate::domain::DesignError;

/// Errors that stop a variant run before it can produce a full set.
///
/// Individual slot failures never surface here; they are recorded on the
/// slot's result and summarised in the consistency report.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("requested {requested} variants, must be between 1 and {max}")]
    InvalidVariantCount { requested: usize, max: usize },

    #[error(transparent)]
    InvalidParameters(#[from] DesignError),

    #[error("variant run {run_id} timed out after {after_ms}ms")]
    TimedOut { run_id: Uuid, after_ms: u64 },
}

pub type Result<T> = std::result::Result<T, OrchestrationError>;
