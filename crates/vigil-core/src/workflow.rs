use serde::{Deserialize, Serialize};

use crate::applicability::Applicability;
use crate::condition::ConditionOperator;

/// A named, ordered collection of rules plus execution constraints and
/// platform applicability metadata. Immutable input to the orchestrator.
///
/// Invariant: rule names are unique within a workflow. Dependency lookup
/// and result correlation rely on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub name: String,
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    /// `None` means the workflow applies everywhere.
    #[serde(default)]
    pub applicability: Option<Applicability>,
    #[serde(default)]
    pub constraints: Constraints,
    pub rules: Vec<RuleDefinition>,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

impl WorkflowDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema_version: default_schema_version(),
            applicability: None,
            constraints: Constraints::default(),
            rules: Vec::new(),
        }
    }

    pub fn with_rules(mut self, rules: Vec<RuleDefinition>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_applicability(mut self, applicability: Applicability) -> Self {
        self.applicability = Some(applicability);
        self
    }
}

/// Workflow-level execution constraints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    /// Run rules in declaration order, one at a time.
    #[serde(default)]
    pub run_sequentially: bool,
    /// In sequential mode, stop at the first failing rule.
    #[serde(default)]
    pub stop_on_failure: bool,
    /// Whole-workflow deadline; on expiry the orchestration is cancelled
    /// and unrun rules are absent from the results.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// A single probe-and-condition check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDefinition {
    pub name: String,
    /// Which probe provider handles this rule (case-insensitive lookup).
    pub provider: String,
    /// Provider-specific parameter bag, opaque to the orchestrator.
    #[serde(default)]
    pub parameters: serde_json::Value,
    pub condition: Condition,
    /// How bad a failure of this rule is, 0–10 by convention.
    #[serde(default)]
    pub severity: u8,
    /// Shown when the rule passes.
    #[serde(default)]
    pub message: Option<String>,
    /// Shown when the condition fails; a message describing
    /// expected-vs-actual is synthesized when absent.
    #[serde(default)]
    pub failure_message: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, rename = "executionOptions")]
    pub execution: ExecutionOptions,
}

impl RuleDefinition {
    pub fn new(name: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            parameters: serde_json::Value::Null,
            condition: Condition::exists(),
            severity: 5,
            message: None,
            failure_message: None,
            tags: Vec::new(),
            execution: ExecutionOptions::default(),
        }
    }

    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_condition(mut self, operator: ConditionOperator, expected: serde_json::Value) -> Self {
        self.condition = Condition { operator, expected };
        self
    }

    pub fn with_severity(mut self, severity: u8) -> Self {
        self.severity = severity;
        self
    }

    pub fn depends_on(mut self, deps: &[&str]) -> Self {
        self.execution.depends_on = deps.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn stop_on_failure(mut self) -> Self {
        self.execution.stop_on_failure = true;
        self
    }
}

/// Operator + expected value evaluated against the probed value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub operator: ConditionOperator,
    #[serde(default)]
    pub expected: serde_json::Value,
}

impl Condition {
    pub fn exists() -> Self {
        Self {
            operator: ConditionOperator::Exists,
            expected: serde_json::Value::Null,
        }
    }
}

/// Hint for schedulers that honor per-rule mode preferences. The
/// orchestrator schedules by the workflow-level `run_sequentially` flag;
/// this is advisory metadata carried through from the definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Sequential,
    Concurrent,
}

/// Per-rule scheduling options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionOptions {
    /// Names of rules in the same workflow that must have *succeeded*
    /// before this rule may start. A failed dependency never unblocks
    /// its dependents.
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// In sequential mode, halt the workflow if this rule fails.
    #[serde(default)]
    pub stop_on_failure: bool,
    /// Bounds this rule's probe invocation; expiry is an ordinary rule
    /// failure, not a workflow abort.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub run_mode: Option<RunMode>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rule_definition_roundtrip() {
        let rule = RuleDefinition::new("fw-enabled", "registry")
            .with_parameters(json!({"path": "HKLM\\fw", "value": "Enabled"}))
            .with_condition(ConditionOperator::Equals, json!(1))
            .with_severity(8)
            .depends_on(&["fw-present"]);

        let text = serde_json::to_string(&rule).unwrap();
        let back: RuleDefinition = serde_json::from_str(&text).unwrap();
        assert_eq!(back.name, "fw-enabled");
        assert_eq!(back.execution.depends_on, vec!["fw-present"]);
        assert_eq!(back.severity, 8);
    }

    #[test]
    fn workflow_defaults() {
        let wf = WorkflowDefinition::new("baseline");
        assert_eq!(wf.schema_version, "1.0");
        assert!(wf.applicability.is_none());
        assert!(!wf.constraints.run_sequentially);
        assert!(wf.constraints.timeout_secs.is_none());
    }

    #[test]
    fn unknown_operator_deserializes_fail_closed() {
        let cond: Condition =
            serde_json::from_str(r#"{"operator": "FuzzyMatch", "expected": 1}"#).unwrap();
        assert_eq!(cond.operator, ConditionOperator::Unknown);
    }
}
