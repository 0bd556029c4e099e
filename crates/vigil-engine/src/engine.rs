//! Engine front door: applicability filtering plus fan-out of workflows to
//! the orchestrator. Workflows run concurrently with respect to one another
//! and share no mutable state.

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use vigil_core::applicability::Platform;
use vigil_core::types::WorkflowResultSet;
use vigil_core::workflow::WorkflowDefinition;

use crate::orchestrator::WorkflowOrchestrator;
use crate::registry::ProviderRegistry;

pub struct AuditEngine {
    registry: Arc<ProviderRegistry>,
    platform: Platform,
}

impl AuditEngine {
    /// Build an engine for the detected platform.
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            platform: Platform::detect(),
        }
    }

    /// Override the platform the applicability evaluator sees, for callers
    /// with a richer version/product source than `Platform::detect`.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Run every applicable workflow and collect one scorecard per
    /// workflow, in input order. Workflows that fail applicability are
    /// skipped entirely and absent from the output.
    pub async fn run(
        &self,
        workflows: &[WorkflowDefinition],
        cancel: CancellationToken,
    ) -> Vec<WorkflowResultSet> {
        let mut in_flight = JoinSet::new();
        let mut admitted = 0usize;

        for (index, workflow) in workflows.iter().enumerate() {
            if let Some(applicability) = &workflow.applicability {
                if !applicability.applies_to(&self.platform) {
                    info!(
                        workflow = %workflow.name,
                        family = %self.platform.family,
                        "Workflow not applicable to this platform; skipped"
                    );
                    continue;
                }
            }
            admitted += 1;

            let orchestrator = WorkflowOrchestrator::new(Arc::clone(&self.registry));
            let workflow = workflow.clone();
            let token = cancel.clone();
            in_flight.spawn(async move { (index, orchestrator.run(&workflow, &token).await) });
        }

        info!(admitted, total = workflows.len(), "Audit run started");

        let mut scored = Vec::with_capacity(admitted);
        while let Some(joined) = in_flight.join_next().await {
            match joined {
                Ok(entry) => scored.push(entry),
                Err(e) => error!(error = %e, "Workflow orchestration task failed to join"),
            }
        }
        scored.sort_by_key(|(index, _)| *index);
        scored.into_iter().map(|(_, set)| set).collect()
    }
}
