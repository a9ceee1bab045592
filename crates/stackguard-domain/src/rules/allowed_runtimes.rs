use crate::intrinsic::resolve;
use crate::model::EvaluationContext;
use crate::policy::RulePolicy;
use crate::rules::utils::{allow_list_text, require_allowlist};
use crate::rules::{Rule, RuleError};
use crate::verdict::{Verdict, Violation};
use crate::walker::{self, LAMBDA_FUNCTION};
use serde_json::json;
use stackguard_types::{PropertyPointer, ids};

pub struct AllowedRuntimes;

impl Rule for AllowedRuntimes {
    fn id(&self) -> &'static str {
        ids::RULE_ALLOWED_RUNTIMES
    }

    fn evaluate(
        &self,
        ctx: &EvaluationContext,
        policy: &RulePolicy,
    ) -> Result<Vec<Verdict>, RuleError> {
        let allow = require_allowlist(&policy.allow)?;
        let permitted = allow_list_text(&policy.allow);
        let mut out = Vec::new();

        for (logical_id, function) in walker::select_by_type(&ctx.template, LAMBDA_FUNCTION) {
            // Container image functions have no runtime.
            let Some(runtime) = walker::property(function, &["Runtime"]) else {
                out.push(Verdict::Approved);
                continue;
            };
            let pointer = PropertyPointer::property(logical_id, &["Runtime"]);

            let resolved = resolve(runtime);
            let verdict = match resolved.values().find(|v| !allow.is_match(*v)) {
                Some(value) => Verdict::Failed(
                    Violation::new(
                        ids::CODE_RUNTIME_NOT_ALLOWED,
                        format!(
                            "Runtime {value} of function '{logical_id}' is not in the list of permitted runtimes: {permitted}"
                        ),
                    )
                    .at(logical_id, pointer)
                    .subject(value)
                    .help("Move the function to a permitted runtime or extend the allowlist.")
                    .data(json!({
                        "function": logical_id,
                        "runtime": value,
                        "allow": policy.allow,
                    })),
                ),
                None if resolved.has_unresolved() && policy.fail_closed => Verdict::Failed(
                    Violation::new(
                        ids::CODE_UNRESOLVED_RUNTIME,
                        format!(
                            "Runtime of function '{logical_id}' comes from {}, which cannot be resolved before deployment.",
                            runtime.describe()
                        ),
                    )
                    .at(logical_id, pointer)
                    .help("Use a literal runtime or disable fail_closed for this rule.")
                    .data(json!({ "function": logical_id })),
                ),
                None => Verdict::Approved,
            };
            out.push(verdict);
        }

        Ok(out)
    }
}
