use crate::model::EvaluationContext;
use crate::policy::RulePolicy;
use crate::rules::utils::{allow_list_text, require_allowlist};
use crate::rules::{Rule, RuleError};
use crate::verdict::{Verdict, Violation};
use serde_json::json;
use stackguard_types::ids;

pub struct AllowedRegions;

impl Rule for AllowedRegions {
    fn id(&self) -> &'static str {
        ids::RULE_ALLOWED_REGIONS
    }

    fn evaluate(
        &self,
        ctx: &EvaluationContext,
        policy: &RulePolicy,
    ) -> Result<Vec<Verdict>, RuleError> {
        let allow = require_allowlist(&policy.allow)?;

        let verdict = match ctx.meta.region.as_deref() {
            Some(region) if allow.is_match(region) => Verdict::Approved,
            Some(region) => Verdict::Failed(
                Violation::new(
                    ids::CODE_REGION_NOT_ALLOWED,
                    format!(
                        "Region \"{region}\" is not in the list of permitted regions: {}",
                        allow_list_text(&policy.allow)
                    ),
                )
                .help("Deploy to a permitted region or extend the allowlist.")
                .data(json!({ "region": region, "allow": policy.allow })),
            ),
            None if policy.fail_closed => Verdict::Failed(
                Violation::new(
                    ids::CODE_UNKNOWN_REGION,
                    "Deployment region is unknown; it must be one of the permitted regions.",
                )
                .help("Pass --region when evaluating."),
            ),
            None => Verdict::Approved,
        };

        Ok(vec![verdict])
    }
}
