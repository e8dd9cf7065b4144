//! Consistency report over one variant run.

use serde::{Deserialize, Serialize};

use crate::domain::{DesignResult, FailureKind};

pub const LOW_CONSISTENCY: &str =
    "Low consistency detected. Consider refining prompts or adjusting generation parameters.";
pub const REDUCE_PARALLEL_AGENTS: &str =
    "More than half of the generation calls failed. Reduce the number of parallel agents.";
pub const CHECK_API_KEY: &str =
    "Every failure was an authentication problem. Check the provider API key.";
pub const LOWER_CONCURRENCY: &str =
    "The provider rate-limited some calls. Lower the maximum concurrency.";

/// Thresholds that decide which recommendations a report carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyPolicy {
    /// Scores strictly below this are flagged as low consistency.
    pub low_consistency_threshold: f64,
    /// Failure rates strictly above this suggest fewer parallel agents.
    pub max_failure_rate: f64,
}

impl Default for ConsistencyPolicy {
    fn default() -> Self {
        Self {
            low_consistency_threshold: 70.0,
            max_failure_rate: 0.5,
        }
    }
}

/// Read-only summary of a variant set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub total_designs: usize,
    pub successful: usize,
    pub failed: usize,
    /// `100 * successful / total`, in `[0, 100]`.
    pub consistency_score: f64,
    pub recommendations: Vec<String>,
}

/// Percentage of successful calls. An empty run scores zero.
pub fn consistency_score(successful: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    100.0 * successful as f64 / total as f64
}

impl ConsistencyReport {
    pub fn from_results<'a, I>(results: I, policy: &ConsistencyPolicy) -> Self
    where
        I: IntoIterator<Item = &'a DesignResult>,
    {
        let mut total = 0;
        let mut successful = 0;
        let mut failures: Vec<FailureKind> = Vec::new();
        for result in results {
            total += 1;
            if result.success {
                successful += 1;
            } else {
                failures.push(result.failure_kind().unwrap_or(FailureKind::Internal));
            }
        }

        let score = consistency_score(successful, total);
        let failed = total - successful;
        let mut recommendations = Vec::new();

        if score < policy.low_consistency_threshold {
            recommendations.push(LOW_CONSISTENCY.to_string());
        }
        if total > 0 && failed as f64 / total as f64 > policy.max_failure_rate {
            recommendations.push(REDUCE_PARALLEL_AGENTS.to_string());
        }
        if !failures.is_empty() && failures.iter().all(|k| k.is_credential_related()) {
            recommendations.push(CHECK_API_KEY.to_string());
        }
        if failures.contains(&FailureKind::RateLimited) {
            recommendations.push(LOWER_CONCURRENCY.to_string());
        }

        Self {
            total_designs: total,
            successful,
            failed,
            consistency_score: score,
            recommendations,
        }
    }

    pub fn failure_rate(&self) -> f64 {
        if self.total_designs == 0 {
            return 0.0;
        }
        self.failed as f64 / self.total_designs as f64
    }
}
