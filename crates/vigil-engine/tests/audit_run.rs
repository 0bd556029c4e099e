//! End-to-end: real probe providers wired through the engine front door.

use std::io::Write;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use vigil_core::applicability::{Applicability, Platform};
use vigil_core::condition::ConditionOperator;
use vigil_core::workflow::{RuleDefinition, WorkflowDefinition};
use vigil_engine::{AuditEngine, ProviderRegistry};
use vigil_probes::builtin_providers;

fn engine() -> AuditEngine {
    let registry = ProviderRegistry::from_providers(builtin_providers()).unwrap();
    AuditEngine::new(registry).with_platform(Platform::new("linux").with_version("6.1"))
}

#[tokio::test]
async fn audits_filesystem_state_with_dependencies() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"max_log_size = 4096\n").unwrap();
    let path = file.path().to_string_lossy().to_string();

    let workflow = WorkflowDefinition::new("log-config").with_rules(vec![
        RuleDefinition::new("config-present", "file")
            .with_parameters(json!({ "path": path }))
            .with_condition(ConditionOperator::Equals, json!(true))
            .with_severity(9),
        RuleDefinition::new("config-nonempty", "file")
            .with_parameters(json!({ "path": path, "attribute": "size" }))
            .with_condition(ConditionOperator::GreaterThan, json!(0))
            .with_severity(6)
            .depends_on(&["config-present"]),
    ]);

    let sets = engine().run(&[workflow], CancellationToken::new()).await;

    assert_eq!(sets.len(), 1);
    let set = &sets[0];
    assert!(set.success, "unexpected failure: {:?}", set.rule_results);
    assert!(set.is_complete());
    assert_eq!(set.severity_score, 0);
}

#[tokio::test]
async fn missing_prerequisite_blocks_the_dependent_check() {
    let workflow = WorkflowDefinition::new("ghost-config").with_rules(vec![
        RuleDefinition::new("config-present", "file")
            .with_parameters(json!({ "path": "/etc/vigil/no-such-config" }))
            .with_condition(ConditionOperator::Equals, json!(true))
            .with_severity(9),
        RuleDefinition::new("config-nonempty", "file")
            .with_parameters(json!({ "path": "/etc/vigil/no-such-config", "attribute": "size" }))
            .with_condition(ConditionOperator::GreaterThan, json!(0))
            .depends_on(&["config-present"]),
    ]);

    let sets = engine().run(&[workflow], CancellationToken::new()).await;

    let set = &sets[0];
    assert!(!set.success);
    assert_eq!(set.rule_results.len(), 1);
    assert_eq!(set.severity_score, 9);
    assert!(!set.is_complete());
}

#[tokio::test]
async fn mixed_providers_and_applicability_in_one_run() {
    let applicable = WorkflowDefinition::new("portable-baseline")
        .with_applicability(Applicability::for_family("linux"))
        .with_rules(vec![
            RuleDefinition::new("marker", "static")
                .with_parameters(json!({ "value": "hardened" }))
                .with_condition(ConditionOperator::Contains, json!("hard")),
            RuleDefinition::new("no-debug-env", "env")
                .with_parameters(json!({ "name": "VIGIL_E2E_DEBUG_FLAG" }))
                .with_condition(ConditionOperator::NotExists, json!(null))
                .with_severity(4),
        ]);
    let skipped = WorkflowDefinition::new("windows-baseline")
        .with_applicability(Applicability::for_family("windows"))
        .with_rules(vec![RuleDefinition::new("never-runs", "static")
            .with_parameters(json!({ "value": 1 }))
            .with_condition(ConditionOperator::Exists, json!(null))]);

    let sets = engine()
        .run(&[applicable, skipped], CancellationToken::new())
        .await;

    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].workflow_name, "portable-baseline");
    assert!(sets[0].success);
}

#[tokio::test]
async fn regex_condition_against_command_output() {
    let workflow = WorkflowDefinition::new("echo-check").with_rules(vec![
        RuleDefinition::new("banner", "command")
            .with_parameters(json!({ "program": "echo", "args": ["vigil 0.1"] }))
            .with_condition(ConditionOperator::RegexMatch, json!(r#""stdout":"vigil"#)),
    ]);

    let sets = engine().run(&[workflow], CancellationToken::new()).await;
    assert!(sets[0].success, "unexpected failure: {:?}", sets[0].rule_results);
}
