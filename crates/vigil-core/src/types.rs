use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity assigned when a probe provider reports it could not obtain a value.
pub const SEVERITY_PROBE_FAILURE: u8 = 9;

/// Severity assigned to configuration and internal errors: a missing provider,
/// a provider that returned an error, or a per-rule timeout.
pub const SEVERITY_INTERNAL: u8 = 10;

/// Outcome of one probe invocation.
///
/// Ordinary failures (path not found, access denied, malformed parameters)
/// are expressed as `success: false`, never as an `Err` from the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    /// The probed value. `None` means the probed entity is absent, which is
    /// a legitimate observation (`Exists`/`NotExists` conditions rely on it).
    pub value: Option<serde_json::Value>,
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Provenance: which path/variable/query produced the value.
    pub metadata: HashMap<String, String>,
}

impl ProbeResult {
    /// A successful probe that observed a value.
    pub fn found(value: serde_json::Value) -> Self {
        Self {
            value: Some(value),
            success: true,
            message: String::new(),
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// A successful probe that observed the entity to be absent.
    pub fn absent(message: impl Into<String>) -> Self {
        Self {
            value: None,
            success: true,
            message: message.into(),
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// The provider could not obtain a value.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            value: None,
            success: false,
            message: message.into(),
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Outcome of one rule execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleResult {
    pub rule_name: String,
    pub success: bool,
    pub message: String,
    /// The rule's declared severity when it failed; 0 when it succeeded.
    pub severity_score: u8,
    pub timestamp: DateTime<Utc>,
}

impl RuleResult {
    pub fn passed(rule_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            success: true,
            message: message.into(),
            severity_score: 0,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(
        rule_name: impl Into<String>,
        severity: u8,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            success: false,
            message: message.into(),
            // 0–10 is convention, not schema; clamp rather than reject.
            severity_score: severity.min(SEVERITY_INTERNAL),
            timestamp: Utc::now(),
        }
    }
}

/// Scored outcome of one workflow orchestration.
///
/// `rule_results` may be shorter than `rules_defined`: stop-on-failure,
/// dependency deadlock, and timeout all yield partial runs in which unrun
/// rules are simply absent. Callers distinguish "all rules ran and passed"
/// from "some rules never ran" by comparing the two counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResultSet {
    pub workflow_name: String,
    /// True iff every collected rule result succeeded. Vacuously true when
    /// no rule produced a result.
    pub success: bool,
    /// Max severity over failed rules; 0 when none failed.
    pub severity_score: u8,
    pub timestamp: DateTime<Utc>,
    pub rule_results: Vec<RuleResult>,
    /// How many rules the workflow declared, for partial-run detection.
    pub rules_defined: usize,
}

impl WorkflowResultSet {
    /// Fold collected rule results into a scorecard.
    pub fn score(
        workflow_name: impl Into<String>,
        rules_defined: usize,
        rule_results: Vec<RuleResult>,
    ) -> Self {
        let success = rule_results.iter().all(|r| r.success);
        let severity_score = rule_results
            .iter()
            .filter(|r| !r.success)
            .map(|r| r.severity_score)
            .max()
            .unwrap_or(0);
        Self {
            workflow_name: workflow_name.into(),
            success,
            severity_score,
            timestamp: Utc::now(),
            rule_results,
            rules_defined,
        }
    }

    /// Whether every declared rule produced a result.
    pub fn is_complete(&self) -> bool {
        self.rule_results.len() == self.rules_defined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_takes_max_severity_over_failures() {
        let results = vec![
            RuleResult::passed("a", "ok"),
            RuleResult::failed("b", 6, "bad"),
            RuleResult::failed("c", 9, "worse"),
        ];
        let set = WorkflowResultSet::score("wf", 3, results);
        assert!(!set.success);
        assert_eq!(set.severity_score, 9);
        assert!(set.is_complete());
    }

    #[test]
    fn empty_result_list_is_vacuously_successful() {
        let set = WorkflowResultSet::score("wf", 2, vec![]);
        assert!(set.success);
        assert_eq!(set.severity_score, 0);
        assert!(!set.is_complete());
    }

    #[test]
    fn failed_severity_is_clamped() {
        let r = RuleResult::failed("a", 250, "bad");
        assert_eq!(r.severity_score, SEVERITY_INTERNAL);
    }

    #[test]
    fn passed_rule_scores_zero() {
        let r = RuleResult::passed("a", "ok");
        assert_eq!(r.severity_score, 0);
    }
}
