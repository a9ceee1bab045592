use crate::fingerprint::fingerprint_for_finding;
use crate::model::EvaluationContext;
use crate::policy::{EffectiveConfig, FailOn, RulePolicy};
use crate::report::{DomainReport, SeverityCounts};
use crate::rules::{self, Rule};
use crate::verdict::{RuleOutcome, RuleStatus, Violation};
use stackguard_types::{Finding, Location, Severity, StackguardData, VerdictStatus, ids};
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Evaluate every built-in rule against `ctx`.
pub fn evaluate(ctx: &EvaluationContext, cfg: &EffectiveConfig) -> DomainReport {
    evaluate_rules(&rules::catalog(), ctx, cfg)
}

/// Evaluate `rules` in order. A rule that errors or panics is reported as errored; the
/// remaining rules still run.
pub fn evaluate_rules(
    rules: &[Box<dyn Rule>],
    ctx: &EvaluationContext,
    cfg: &EffectiveConfig,
) -> DomainReport {
    let mut findings: Vec<Finding> = Vec::new();
    let mut outcomes: Vec<RuleOutcome> = Vec::new();
    let mut skipped = 0u32;

    for rule in rules {
        let rule_id = rule.id();
        let Some(policy) = cfg.rule_policy(rule_id) else {
            tracing::debug!(rule = rule_id, "rule disabled");
            skipped += 1;
            continue;
        };

        let status = run_rule(rule.as_ref(), ctx, policy);
        match &status {
            RuleStatus::Evaluated(verdicts) => {
                for violation in verdicts.iter().filter_map(|v| v.violation()) {
                    findings.push(to_finding(rule_id, policy.severity, violation));
                }
            }
            RuleStatus::Errored(message) => {
                tracing::warn!(rule = rule_id, error = %message, "rule errored");
                findings.push(errored_finding(rule_id, message));
            }
        }

        let outcome = RuleOutcome { rule_id, status };
        tracing::debug!(
            rule = rule_id,
            approvals = outcome.approvals(),
            failures = outcome.failures(),
            "rule evaluated"
        );
        outcomes.push(outcome);
    }

    let status = compute_status(&findings, cfg.fail_on);
    let counts = SeverityCounts::from_findings(&findings);

    let data = StackguardData {
        profile: cfg.profile.clone(),
        template: None,
        service: ctx.meta.service.clone(),
        stage: ctx.meta.stage.clone(),
        region: ctx.meta.region.clone(),
        resources_scanned: ctx.template.resources.len() as u32,
        rules_evaluated: outcomes.len() as u32,
        rules_skipped: skipped,
        findings_total: findings.len() as u32,
    };

    DomainReport {
        status,
        findings,
        outcomes,
        data,
        counts,
    }
}

fn run_rule(rule: &dyn Rule, ctx: &EvaluationContext, policy: &RulePolicy) -> RuleStatus {
    match catch_unwind(AssertUnwindSafe(|| rule.evaluate(ctx, policy))) {
        Ok(Ok(verdicts)) => RuleStatus::Evaluated(verdicts),
        Ok(Err(err)) => RuleStatus::Errored(err.to_string()),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            RuleStatus::Errored(format!("internal fault: {message}"))
        }
    }
}

fn to_finding(rule_id: &str, severity: Severity, violation: &Violation) -> Finding {
    let fingerprint = fingerprint_for_finding(
        rule_id,
        violation.code,
        violation.resource.as_deref(),
        violation.pointer.as_ref().map(|p| p.as_str()),
        violation.subject.as_deref(),
    );
    Finding {
        severity,
        rule_id: rule_id.to_string(),
        code: violation.code.to_string(),
        message: violation.message.clone(),
        location: violation.resource.as_ref().map(|resource| Location {
            resource: resource.clone(),
            pointer: violation.pointer.clone(),
        }),
        help: violation.help.map(str::to_string),
        fingerprint: Some(fingerprint),
        data: violation.data.clone(),
    }
}

fn errored_finding(rule_id: &str, message: &str) -> Finding {
    Finding {
        severity: Severity::Error,
        rule_id: rule_id.to_string(),
        code: ids::CODE_RULE_ERRORED.to_string(),
        message: format!("Rule {rule_id} could not be evaluated: {message}"),
        location: None,
        help: Some("Fix the rule configuration, or disable the rule.".to_string()),
        fingerprint: Some(fingerprint_for_finding(
            rule_id,
            ids::CODE_RULE_ERRORED,
            None,
            None,
            None,
        )),
        data: serde_json::json!({ "error": message }),
    }
}

fn compute_status(findings: &[Finding], fail_on: FailOn) -> VerdictStatus {
    let has_error = findings.iter().any(|f| f.severity == Severity::Error);
    if has_error {
        return VerdictStatus::Fail;
    }

    let has_warn = findings.iter().any(|f| f.severity == Severity::Warning);
    if has_warn {
        return match fail_on {
            FailOn::Warning => VerdictStatus::Fail,
            FailOn::Error => VerdictStatus::Warn,
        };
    }

    VerdictStatus::Pass
}
