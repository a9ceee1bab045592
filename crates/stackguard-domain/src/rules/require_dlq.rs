use crate::model::{EvaluationContext, FnKind, Value};
use crate::policy::RulePolicy;
use crate::rules::utils::{build_allowlist, is_allowed};
use crate::rules::{Rule, RuleError};
use crate::verdict::{Verdict, Violation};
use crate::walker::{self, LAMBDA_FUNCTION};
use serde_json::json;
use stackguard_types::{PropertyPointer, ids};

pub struct RequireDlq;

/// Whether `DeadLetterConfig.TargetArn` will be set once deployed.
#[derive(Debug, PartialEq, Eq)]
enum Target {
    Present,
    Missing,
    /// Decided at deploy time, possibly as `AWS::NoValue`.
    Undetermined,
}

fn target(value: Option<&Value>) -> Target {
    match value {
        None | Some(Value::Null) => Target::Missing,
        Some(Value::Str(s)) if s.is_empty() => Target::Missing,
        Some(Value::Ref(name)) if name == "AWS::NoValue" => Target::Missing,
        Some(Value::Str(_) | Value::Ref(_)) => Target::Present,
        Some(Value::Call(call)) if !matches!(call.kind, FnKind::Other(_)) => Target::Present,
        Some(_) => Target::Undetermined,
    }
}

impl Rule for RequireDlq {
    fn id(&self) -> &'static str {
        ids::RULE_REQUIRE_DLQ
    }

    fn evaluate(
        &self,
        ctx: &EvaluationContext,
        policy: &RulePolicy,
    ) -> Result<Vec<Verdict>, RuleError> {
        // Allowlist entries are logical IDs of functions exempt from the rule.
        let allow = build_allowlist(&policy.allow)?;
        let mut out = Vec::new();

        for (logical_id, function) in walker::select_by_type(&ctx.template, LAMBDA_FUNCTION) {
            let pointer = PropertyPointer::property(logical_id, &["DeadLetterConfig"]);
            let value = walker::property(function, &["DeadLetterConfig", "TargetArn"]);

            let state = if is_allowed(allow.as_ref(), logical_id) {
                Target::Present
            } else {
                target(value)
            };

            let verdict = match state {
                Target::Present => Verdict::Approved,
                Target::Undetermined if !policy.fail_closed => Verdict::Approved,
                Target::Undetermined => Verdict::Failed(
                    Violation::new(
                        ids::CODE_UNRESOLVED_DLQ,
                        format!(
                            "Dead Letter Queue of function '{logical_id}' comes from {}, which cannot be resolved before deployment.",
                            value.map(Value::describe).unwrap_or_default()
                        ),
                    )
                    .at(logical_id, pointer)
                    .help("Set TargetArn unconditionally or disable fail_closed for this rule.")
                    .data(json!({ "function": logical_id })),
                ),
                Target::Missing => Verdict::Failed(
                    Violation::new(
                        ids::CODE_MISSING_DLQ,
                        format!(
                            "Function '{logical_id}' doesn't have a Dead Letter Queue configured."
                        ),
                    )
                    .at(logical_id, pointer)
                    .help("Set DeadLetterConfig.TargetArn to an SQS queue or SNS topic.")
                    .data(json!({ "function": logical_id })),
                ),
            };
            out.push(verdict);
        }

        Ok(out)
    }
}
