use crate::model::EvaluationContext;
use crate::policy::RulePolicy;
use crate::rules::utils::{allow_list_text, require_allowlist};
use crate::rules::{Rule, RuleError};
use crate::verdict::{Verdict, Violation};
use serde_json::json;
use stackguard_types::ids;

pub struct AllowedStages;

impl Rule for AllowedStages {
    fn id(&self) -> &'static str {
        ids::RULE_ALLOWED_STAGES
    }

    fn evaluate(
        &self,
        ctx: &EvaluationContext,
        policy: &RulePolicy,
    ) -> Result<Vec<Verdict>, RuleError> {
        let allow = require_allowlist(&policy.allow)?;

        let verdict = match ctx.meta.stage.as_deref() {
            Some(stage) if allow.is_match(stage) => Verdict::Approved,
            Some(stage) => Verdict::Failed(
                Violation::new(
                    ids::CODE_STAGE_NOT_ALLOWED,
                    format!(
                        "Stage name \"{stage}\" is not in the list of permitted names: {}",
                        allow_list_text(&policy.allow)
                    ),
                )
                .help("Use a permitted stage name or extend the allowlist.")
                .data(json!({ "stage": stage, "allow": policy.allow })),
            ),
            None if policy.fail_closed => Verdict::Failed(
                Violation::new(
                    ids::CODE_UNKNOWN_STAGE,
                    "Deployment stage is unknown; it must be one of the permitted names.",
                )
                .help("Pass --stage when evaluating."),
            ),
            None => Verdict::Approved,
        };

        Ok(vec![verdict])
    }
}
