//! The `explain` use case: what a rule checks, which codes it emits, and how the active
//! configuration runs it.

use stackguard_domain::policy::{EffectiveConfig, RulePolicy};
use stackguard_types::explain::{self, Explanation};
use stackguard_types::{Severity, ids};

/// A rule (or one of its codes) explained against an effective config.
#[derive(Clone, Debug)]
pub struct RuleExplanation {
    pub identifier: String,
    /// Owning rule; `None` for runner-level codes such as `rule_errored`.
    pub rule_id: Option<&'static str>,
    pub codes: &'static [&'static str],
    pub profile: String,
    /// Effective policy, `None` when the rule is off.
    pub policy: Option<RulePolicy>,
    pub explanation: Explanation,
}

#[derive(Clone, Debug)]
pub enum ExplainOutput {
    Found(Box<RuleExplanation>),
    NotFound { identifier: String },
}

pub fn run_explain(identifier: &str, cfg: &EffectiveConfig) -> ExplainOutput {
    let Some(explanation) = explain::lookup_explanation(identifier) else {
        return ExplainOutput::NotFound {
            identifier: identifier.to_string(),
        };
    };

    let rule_id = ids::ALL_RULE_IDS
        .iter()
        .copied()
        .find(|id| *id == identifier)
        .or_else(|| ids::rule_for_code(identifier));

    ExplainOutput::Found(Box::new(RuleExplanation {
        identifier: identifier.to_string(),
        rule_id,
        codes: rule_id.map(ids::codes_for_rule).unwrap_or_default(),
        profile: cfg.profile.clone(),
        policy: rule_id.and_then(|id| cfg.rule_policy(id)).cloned(),
        explanation,
    }))
}

/// What the `allow` patterns of each rule match against.
fn allow_meaning(rule_id: &str) -> &'static str {
    match rule_id {
        ids::RULE_NO_SECRET_ENV_VARS => "environment variable names to skip",
        ids::RULE_ALLOWED_RUNTIMES => "permitted runtimes",
        ids::RULE_ALLOWED_REGIONS => "permitted regions",
        ids::RULE_ALLOWED_STAGES => "permitted stage names",
        ids::RULE_REQUIRE_DLQ => "function logical IDs exempt from the rule",
        _ => "not used by this rule",
    }
}

fn severity_name(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "info",
        Severity::Warning => "warning",
        Severity::Error => "error",
    }
}

pub fn format_explanation(e: &RuleExplanation) -> String {
    let exp = &e.explanation;
    let mut out = format!("{}\n{}\n\n", exp.title, "=".repeat(exp.title.len()));

    match e.rule_id {
        Some(rule_id) => {
            out.push_str(&format!("Rule:  {rule_id}\n"));
            out.push_str(&format!("Codes: {}\n", e.codes.join(", ")));
            match &e.policy {
                Some(p) => {
                    out.push_str(&format!(
                        "Profile {}: enabled, severity {}\n",
                        e.profile,
                        severity_name(p.severity)
                    ));
                    let patterns = if p.allow.is_empty() {
                        "(none)".to_string()
                    } else {
                        p.allow.join(", ")
                    };
                    out.push_str(&format!(
                        "  allow ({}): {patterns}\n",
                        allow_meaning(rule_id)
                    ));
                    out.push_str(&format!("  fail_closed: {}\n", p.fail_closed));
                }
                None => out.push_str(&format!(
                    "Profile {}: off (enable with [rules.{rule_id}] enabled = true)\n",
                    e.profile
                )),
            }
        }
        None => out.push_str("Emitted by the runner for any rule.\n"),
    }

    out.push('\n');
    out.push_str(exp.description);
    out.push_str("\n\nRemediation\n-----------\n");
    out.push_str(exp.remediation);
    out.push_str(&format!(
        "\n\nBefore:\n```yaml\n{}\n```\n\nAfter:\n```yaml\n{}\n```\n",
        exp.examples.before, exp.examples.after
    ));

    out
}

pub fn format_not_found(identifier: &str) -> String {
    let mut out = format!("Unknown rule_id or code: {identifier}\n\nRules and their codes:\n");
    for rule_id in ids::ALL_RULE_IDS {
        out.push_str(&format!(
            "  {rule_id}: {}\n",
            ids::codes_for_rule(rule_id).join(", ")
        ));
    }
    out.push_str(&format!("  (any rule): {}\n", ids::CODE_RULE_ERRORED));
    out
}
