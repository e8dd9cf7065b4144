use std::path::PathBuf;
use std::sync::Arc;

use designforge_core::{
    DesignId, DesignRegistry, DesignResult, GenerationClient, OrchestratorConfig, ScoringRubric,
    VariantOrchestrator,
};

use crate::api::DesignRef;

/// Everything a request handler needs. Shared behind an `Arc`.
pub struct AppState {
    pub client: Arc<GenerationClient>,
    pub orchestrator: VariantOrchestrator,
    pub registry: DesignRegistry,
    pub rubric: ScoringRubric,
    /// Ranks iterations, see [`ScoringRubric::iteration`].
    pub iteration_rubric: ScoringRubric,
    /// Served at `/api/images`.
    pub output_dir: PathBuf,
}

impl AppState {
    pub fn new(
        client: Arc<GenerationClient>,
        orchestrator: OrchestratorConfig,
        rubric: ScoringRubric,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            orchestrator: VariantOrchestrator::new(Arc::clone(&client), orchestrator),
            client,
            registry: DesignRegistry::new(),
            rubric,
            iteration_rubric: ScoringRubric::iteration(),
            output_dir: output_dir.into(),
        }
    }

    /// Keep at most `max_designs` results addressable by id.
    pub fn with_max_designs(mut self, max_designs: usize) -> Self {
        self.registry = DesignRegistry::with_capacity(max_designs);
        self
    }

    /// Resolve selection candidates. Ids that are not registered are
    /// returned as the error.
    pub fn resolve_candidates(
        &self,
        designs: Vec<DesignRef>,
    ) -> Result<Vec<Arc<DesignResult>>, Vec<DesignId>> {
        let mut candidates = Vec::with_capacity(designs.len());
        let mut unknown = Vec::new();
        for design in designs {
            match design {
                DesignRef::Result(result) => candidates.push(Arc::new(*result)),
                DesignRef::Id(id) => match self.registry.get(&id) {
                    Some(result) => candidates.push(result),
                    None => unknown.push(id),
                },
            }
        }
        if unknown.is_empty() {
            Ok(candidates)
        } else {
            Err(unknown)
        }
    }
}
