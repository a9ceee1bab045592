use crate::model::{DeploymentMeta, EvaluationContext, Template};
use crate::policy::{EffectiveConfig, FailOn, RulePolicy};
use crate::verdict::Verdict;
use serde_json::json;
use stackguard_types::Severity;
use std::collections::BTreeMap;

pub fn ctx(template: serde_json::Value) -> EvaluationContext {
    EvaluationContext::new(
        Template::from_json(&template).expect("test template"),
        DeploymentMeta::default(),
    )
}

/// A template holding one IAM role with one inline statement.
pub fn role_with_statement(statement: serde_json::Value) -> EvaluationContext {
    ctx(json!({
        "Resources": {
            "IamRoleLambdaExecution": {
                "Type": "AWS::IAM::Role",
                "Properties": {
                    "Policies": [{
                        "PolicyName": "dev-service-lambda",
                        "PolicyDocument": {
                            "Version": "2012-10-17",
                            "Statement": [statement]
                        }
                    }]
                }
            }
        }
    }))
}

pub fn function(properties: serde_json::Value) -> EvaluationContext {
    ctx(json!({
        "Resources": {
            "HelloLambdaFunction": {
                "Type": "AWS::Lambda::Function",
                "Properties": properties
            }
        }
    }))
}

pub fn policy() -> RulePolicy {
    RulePolicy::enabled(Severity::Error)
}

pub fn fail_closed() -> RulePolicy {
    RulePolicy {
        fail_closed: true,
        ..policy()
    }
}

pub fn messages(verdicts: &[Verdict]) -> Vec<String> {
    verdicts
        .iter()
        .filter_map(Verdict::violation)
        .map(|v| v.message.clone())
        .collect()
}

pub fn approvals(verdicts: &[Verdict]) -> usize {
    verdicts.iter().filter(|v| !v.is_failed()).count()
}

/// Config with exactly the listed rules enabled.
pub fn config_with(rules: &[(&str, RulePolicy)]) -> EffectiveConfig {
    EffectiveConfig {
        profile: "test".to_string(),
        fail_on: FailOn::Error,
        rules: rules
            .iter()
            .map(|(id, p)| (id.to_string(), p.clone()))
            .collect::<BTreeMap<_, _>>(),
    }
}
