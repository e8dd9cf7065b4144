//! Structured lifecycle events for variant runs, selections and comparisons.
//!
//! Events go out at `info!` (timeouts at `warn!`) with an `event` field so
//! they can be filtered in JSON log pipelines.

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::FailureKind;

/// Span that groups every event of one variant run.
pub fn variant_run_span(run_id: &Uuid, requested: usize) -> tracing::Span {
    tracing::info_span!("designforge.variant_run", run_id = %run_id, requested = requested)
}

pub fn emit_variant_run_started(run_id: &Uuid, requested: usize, max_concurrency: usize) {
    info!(
        event = "variant_run.started",
        run_id = %run_id,
        requested = requested,
        max_concurrency = max_concurrency,
    );
}

/// One slot settled, successfully or not.
pub fn emit_slot_settled(run_id: &Uuid, slot: usize, success: bool, failure: Option<FailureKind>) {
    info!(
        event = "variant_run.slot_settled",
        run_id = %run_id,
        slot = slot,
        success = success,
        failure = ?failure,
    );
}

pub fn emit_variant_run_finished(
    run_id: &Uuid,
    total: usize,
    successful: usize,
    consistency_score: f64,
    duration_ms: u64,
) {
    info!(
        event = "variant_run.finished",
        run_id = %run_id,
        total = total,
        successful = successful,
        consistency_score = consistency_score,
        duration_ms = duration_ms,
    );
}

pub fn emit_variant_run_timed_out(run_id: &Uuid, after_ms: u64) {
    warn!(event = "variant_run.timed_out", run_id = %run_id, after_ms = after_ms);
}

pub fn emit_selection_made(design_id: &str, score: f64, considered: usize, skipped: usize) {
    info!(
        event = "selection.made",
        design_id = %design_id,
        score = score,
        considered = considered,
        skipped = skipped,
    );
}

pub fn emit_comparison_assembled(comparison_id: &str, total: usize) {
    info!(
        event = "comparison.assembled",
        comparison_id = %comparison_id,
        total = total,
    );
}
