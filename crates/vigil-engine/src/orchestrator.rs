//! The workflow scheduler.
//!
//! Rules move Pending → Running → {Succeeded, Failed}; a workflow moves
//! NotStarted → Running → Completed, and Completed is reached whether or
//! not every rule ran. Stop-on-failure, dependency deadlock, and timeout
//! all end a run with a partial result in which unrun rules are simply
//! absent from the result list.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use vigil_core::condition;
use vigil_core::error::{Result, VigilError};
use vigil_core::types::{RuleResult, WorkflowResultSet, SEVERITY_INTERNAL, SEVERITY_PROBE_FAILURE};
use vigil_core::workflow::{RuleDefinition, WorkflowDefinition};

use crate::registry::ProviderRegistry;

/// Executes one workflow against a provider registry.
pub struct WorkflowOrchestrator {
    registry: Arc<ProviderRegistry>,
}

impl WorkflowOrchestrator {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    /// Run every rule of `workflow` exactly once, barring stop-on-failure,
    /// deadlock, or cancellation, and fold the outcomes into a scorecard.
    ///
    /// Never returns an error: cancellation and timeout yield a partial
    /// `WorkflowResultSet` rather than unwinding past this entry point.
    pub async fn run(
        &self,
        workflow: &WorkflowDefinition,
        cancel: &CancellationToken,
    ) -> WorkflowResultSet {
        // One token per orchestration, linked to the caller's. The timeout
        // watchdog cancels this run without touching sibling workflows.
        let run_token = cancel.child_token();
        let watchdog = workflow.constraints.timeout_secs.map(|secs| {
            let token = run_token.clone();
            let name = workflow.name.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(secs)) => {
                        warn!(workflow = %name, timeout_secs = secs, "Workflow timeout elapsed, cancelling run");
                        token.cancel();
                    }
                    _ = token.cancelled() => {}
                }
            })
        });

        info!(
            workflow = %workflow.name,
            rules = workflow.rules.len(),
            sequential = workflow.constraints.run_sequentially,
            "Workflow orchestration started"
        );

        let results = if workflow.constraints.run_sequentially {
            self.run_sequential(workflow, &run_token).await
        } else {
            self.run_concurrent(workflow, &run_token).await
        };

        if let Some(handle) = watchdog {
            handle.abort();
        }

        if results.len() < workflow.rules.len() {
            warn!(
                workflow = %workflow.name,
                executed = results.len(),
                defined = workflow.rules.len(),
                "Workflow completed with a partial result"
            );
        }

        let set = WorkflowResultSet::score(&workflow.name, workflow.rules.len(), results);
        info!(
            workflow = %set.workflow_name,
            success = set.success,
            severity = set.severity_score,
            "Workflow orchestration completed"
        );
        set
    }

    /// Declaration order, one rule at a time.
    async fn run_sequential(
        &self,
        workflow: &WorkflowDefinition,
        cancel: &CancellationToken,
    ) -> Vec<RuleResult> {
        let mut results = Vec::with_capacity(workflow.rules.len());

        for rule in &workflow.rules {
            let outcome =
                Self::execute_rule(Arc::clone(&self.registry), rule.clone(), cancel.clone()).await;
            match outcome {
                Ok(result) => {
                    let failed = !result.success;
                    results.push(result);
                    if failed
                        && (workflow.constraints.stop_on_failure || rule.execution.stop_on_failure)
                    {
                        info!(
                            workflow = %workflow.name,
                            rule = %rule.name,
                            "Rule failed with stop-on-failure set; later rules remain pending"
                        );
                        break;
                    }
                }
                Err(_) => {
                    // Cancelled: the rule never reports, the loop unwinds.
                    warn!(
                        workflow = %workflow.name,
                        rule = %rule.name,
                        "Run cancelled; remaining rules will not run"
                    );
                    break;
                }
            }
        }

        results
    }

    /// Dependency-aware layered scheduling.
    ///
    /// Each iteration selects every pending rule whose dependencies all have
    /// a recorded *successful* result; a failed dependency never unblocks
    /// its dependents (a prerequisite check that failed means its dependents
    /// are not worth probing). The selected layer is removed from the
    /// pending set before anything executes, runs with unbounded fan-out,
    /// and is fully joined before the next selection. This loop is the only
    /// reader and writer of the scheduling state.
    async fn run_concurrent(
        &self,
        workflow: &WorkflowDefinition,
        cancel: &CancellationToken,
    ) -> Vec<RuleResult> {
        let mut remaining: Vec<RuleDefinition> = workflow.rules.clone();
        let mut results: Vec<RuleResult> = Vec::with_capacity(remaining.len());

        while !remaining.is_empty() {
            if cancel.is_cancelled() {
                warn!(
                    workflow = %workflow.name,
                    pending = remaining.len(),
                    "Run cancelled; pending rules will not run"
                );
                break;
            }

            let satisfied: HashSet<&str> = results
                .iter()
                .filter(|r| r.success)
                .map(|r| r.rule_name.as_str())
                .collect();

            let runnable: Vec<usize> = remaining
                .iter()
                .enumerate()
                .filter(|(_, rule)| {
                    rule.execution
                        .depends_on
                        .iter()
                        .all(|dep| satisfied.contains(dep.as_str()))
                })
                .map(|(idx, _)| idx)
                .collect();

            if runnable.is_empty() {
                // Deadlock. Distinguish "blocked on failed prerequisites"
                // from a graph that could never have been satisfied.
                let completed: HashSet<&str> =
                    results.iter().map(|r| r.rule_name.as_str()).collect();
                let blocked_on_failed = remaining
                    .iter()
                    .filter(|rule| {
                        rule.execution
                            .depends_on
                            .iter()
                            .any(|dep| completed.contains(dep.as_str()))
                    })
                    .count();
                if blocked_on_failed == remaining.len() {
                    warn!(
                        workflow = %workflow.name,
                        pending = remaining.len(),
                        "All pending rules depend on failed prerequisites; stopping"
                    );
                } else {
                    warn!(
                        workflow = %workflow.name,
                        pending = remaining.len(),
                        blocked_on_failed,
                        "Unsatisfiable dependency graph; pending rules will never run"
                    );
                }
                break;
            }

            // Remove the layer from the pending set before dispatch so a
            // rule cannot be selected again while in flight. Descending
            // order keeps lower indices valid across swap_remove.
            let mut layer = Vec::with_capacity(runnable.len());
            for idx in runnable.into_iter().rev() {
                layer.push(remaining.swap_remove(idx));
            }

            debug!(
                workflow = %workflow.name,
                layer = layer.len(),
                pending = remaining.len(),
                "Dispatching runnable layer"
            );

            let mut in_flight = JoinSet::new();
            for rule in layer {
                let registry = Arc::clone(&self.registry);
                let token = cancel.clone();
                in_flight.spawn(async move { Self::execute_rule(registry, rule, token).await });
            }
            while let Some(joined) = in_flight.join_next().await {
                match joined {
                    Ok(Ok(result)) => results.push(result),
                    // Cancelled mid-flight: the rule never reports.
                    Ok(Err(_)) => {}
                    Err(e) => {
                        error!(workflow = %workflow.name, error = %e, "Rule task failed to join")
                    }
                }
            }
        }

        results
    }

    /// Execute one rule: resolve the provider, probe, evaluate the
    /// condition. No error escapes to the scheduler except cancellation.
    async fn execute_rule(
        registry: Arc<ProviderRegistry>,
        rule: RuleDefinition,
        cancel: CancellationToken,
    ) -> Result<RuleResult> {
        if cancel.is_cancelled() {
            return Err(VigilError::Cancelled);
        }

        let Some(provider) = registry.get(&rule.provider) else {
            warn!(rule = %rule.name, provider = %rule.provider, "No probe provider registered for rule");
            return Ok(RuleResult::failed(
                &rule.name,
                SEVERITY_INTERNAL,
                format!("probe provider '{}' is not registered", rule.provider),
            ));
        };

        debug!(rule = %rule.name, provider = %rule.provider, "Executing rule");

        let probe = provider.execute(rule.parameters.clone(), cancel.clone());
        let outcome = match rule.execution.timeout_secs {
            Some(secs) => match tokio::time::timeout(Duration::from_secs(secs), probe).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    return Ok(RuleResult::failed(
                        &rule.name,
                        SEVERITY_INTERNAL,
                        format!("probe '{}' timed out after {}s", rule.provider, secs),
                    ));
                }
            },
            None => probe.await,
        };

        let probed = match outcome {
            Ok(result) => result,
            Err(VigilError::Cancelled) => return Err(VigilError::Cancelled),
            Err(e) => {
                error!(
                    rule = %rule.name,
                    provider = %rule.provider,
                    error = %e,
                    "Probe provider returned an internal error"
                );
                return Ok(RuleResult::failed(&rule.name, SEVERITY_INTERNAL, e.to_string()));
            }
        };

        if !probed.success {
            let message = if probed.message.is_empty() {
                format!("probe '{}' could not obtain a value", rule.provider)
            } else {
                probed.message
            };
            return Ok(RuleResult::failed(&rule.name, SEVERITY_PROBE_FAILURE, message));
        }

        let passed = condition::evaluate(
            probed.value.as_ref(),
            rule.condition.operator,
            &rule.condition.expected,
        );
        if passed {
            let message = rule
                .message
                .clone()
                .unwrap_or_else(|| format!("{} passed", rule.name));
            Ok(RuleResult::passed(&rule.name, message))
        } else {
            let message = rule.failure_message.clone().unwrap_or_else(|| {
                let actual = probed
                    .value
                    .as_ref()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "absent".to_string());
                format!(
                    "condition {:?} {} not met; actual value was {}",
                    rule.condition.operator, rule.condition.expected, actual
                )
            });
            Ok(RuleResult::failed(&rule.name, rule.severity, message))
        }
    }
}
