//! Partial-failure tolerant fan-out of variant generation calls.
//!
//! Every slot runs as its own task on a [`JoinSet`]; a semaphore caps how
//! many are talking to the provider at once. Results are merged by slot
//! index only after every task has settled, so the returned set always has
//! exactly one entry per requested slot.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{instrument, warn, Instrument};
use uuid::Uuid;

use crate::domain::{DesignParameters, DesignResult, ProviderError};
use crate::generation::{GenerationClient, ImageKind};
use crate::metrics::METRICS;
use crate::obs;

use super::error::{OrchestrationError, Result};
use super::perturb::{PerturbStrategy, VariantPlan};
use super::report::{ConsistencyPolicy, ConsistencyReport};

/// Configuration for variant runs.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum number of generation calls in flight at once.
    pub max_concurrency: usize,
    /// Largest number of variants a single run may request.
    pub max_variants: usize,
    /// Count used when the caller does not ask for one.
    pub default_variants: usize,
    /// Abort the whole run after this long. `None` waits indefinitely.
    pub run_timeout: Option<Duration>,
    pub consistency: ConsistencyPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            max_variants: 12,
            default_variants: 4,
            run_timeout: None,
            consistency: ConsistencyPolicy::default(),
        }
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// One slot of a variant set.
#[derive(Debug, Clone, Serialize)]
pub struct Variant {
    pub slot: usize,
    pub variant_id: String,
    pub agent_id: String,
    pub priority: u8,
    pub variation_type: String,
    #[serde(flatten)]
    pub result: Arc<DesignResult>,
}

/// Results of one run, indexed by slot.
#[derive(Debug, Clone, Serialize)]
pub struct VariantSet {
    pub run_id: Uuid,
    pub strategy: PerturbStrategy,
    pub variants: Vec<Variant>,
}

impl VariantSet {
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Variant> {
        self.variants.iter()
    }

    /// Shared handles to every result, in slot order.
    pub fn results(&self) -> Vec<Arc<DesignResult>> {
        self.variants.iter().map(|v| Arc::clone(&v.result)).collect()
    }

    pub fn successful(&self) -> impl Iterator<Item = &Variant> {
        self.variants.iter().filter(|v| v.result.success)
    }
}

/// A finished run: the full variant set and its consistency report.
#[derive(Debug, Clone, Serialize)]
pub struct VariantRun {
    pub variant_set: VariantSet,
    pub report: ConsistencyReport,
}

pub struct VariantOrchestrator {
    client: Arc<GenerationClient>,
    config: OrchestratorConfig,
}

impl VariantOrchestrator {
    pub fn new(client: Arc<GenerationClient>, config: OrchestratorConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<GenerationClient> {
        &self.client
    }

    /// Generate `count` variants of `base` concurrently.
    ///
    /// Slot failures are kept as `success = false` entries. The call itself
    /// only fails before dispatch (bad count, invalid base) or when the run
    /// timeout fires, in which case every in-flight call is abandoned and no
    /// partial set is returned.
    pub async fn run(&self, base: &DesignParameters, count: usize) -> Result<VariantRun> {
        self.run_with(base, count, PerturbStrategy::Variants).await
    }

    /// [`run`](Self::run) with iteration steps instead of variant sweeps.
    pub async fn run_iterations(&self, base: &DesignParameters, count: usize) -> Result<VariantRun> {
        self.run_with(base, count, PerturbStrategy::Iterations).await
    }

    /// Fan out the plans `strategy` derives from `base`. Same count limits,
    /// timeout and partial-failure handling for every strategy.
    #[instrument(skip(self, base, strategy), fields(requested = count, strategy = %strategy))]
    pub async fn run_with(
        &self,
        base: &DesignParameters,
        count: usize,
        strategy: PerturbStrategy,
    ) -> Result<VariantRun> {
        if count == 0 || count > self.config.max_variants {
            return Err(OrchestrationError::InvalidVariantCount {
                requested: count,
                max: self.config.max_variants,
            });
        }
        base.validate()?;

        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let fan_out = self
            .fan_out(run_id, strategy.plans(base, count), strategy.image_kind())
            .instrument(obs::variant_run_span(&run_id, count));

        // Dropping the fan-out future drops its JoinSet, which aborts the tasks.
        let variants = match self.config.run_timeout {
            Some(limit) => match tokio::time::timeout(limit, fan_out).await {
                Ok(variants) => variants,
                Err(_) => {
                    let after_ms = millis(limit);
                    obs::emit_variant_run_timed_out(&run_id, after_ms);
                    return Err(OrchestrationError::TimedOut { run_id, after_ms });
                }
            },
            None => fan_out.await,
        };

        let report = ConsistencyReport::from_results(
            variants.iter().map(|v| v.result.as_ref()),
            &self.config.consistency,
        );
        METRICS.inc_variant_runs();
        obs::emit_variant_run_finished(
            &run_id,
            report.total_designs,
            report.successful,
            report.consistency_score,
            millis(started.elapsed()),
        );

        Ok(VariantRun {
            variant_set: VariantSet {
                run_id,
                strategy,
                variants,
            },
            report,
        })
    }

    async fn fan_out(&self, run_id: Uuid, plans: Vec<VariantPlan>, kind: ImageKind) -> Vec<Variant> {
        obs::emit_variant_run_started(&run_id, plans.len(), self.config.max_concurrency);

        let sem = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for plan in &plans {
            let client = Arc::clone(&self.client);
            let sem = Arc::clone(&sem);
            let slot = plan.slot;
            let params = plan.parameters.clone();

            tasks.spawn(
                async move {
                    let _permit = sem.acquire_owned().await.ok();
                    let outcome = client
                        .generate(params.provider(), &params, kind)
                        .await;
                    let result = match outcome {
                        Ok(result) => result,
                        Err(err) => DesignResult::failed(params, &err),
                    };
                    (slot, result)
                }
                .in_current_span(),
            );
        }

        let mut settled: Vec<Option<DesignResult>> = (0..plans.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, result)) => {
                    obs::emit_slot_settled(&run_id, slot, result.success, result.failure_kind());
                    settled[slot] = Some(result);
                }
                Err(err) => warn!(run_id = %run_id, error = %err, "variant task did not complete"),
            }
        }

        plans
            .into_iter()
            .zip(settled)
            .map(|(plan, result)| {
                let result = result.unwrap_or_else(|| {
                    let err = ProviderError::Internal {
                        message: format!("{} did not complete", plan.variant_id),
                    };
                    let failed = DesignResult::failed(plan.parameters.clone(), &err);
                    obs::emit_slot_settled(&run_id, plan.slot, false, failed.failure_kind());
                    failed
                });
                Variant {
                    slot: plan.slot,
                    variant_id: plan.variant_id,
                    agent_id: plan.agent_id,
                    priority: plan.priority,
                    variation_type: plan.variation_type,
                    result: Arc::new(result),
                }
            })
            .collect()
    }
}
