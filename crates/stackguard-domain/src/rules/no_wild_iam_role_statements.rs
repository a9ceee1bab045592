use crate::intrinsic::{WILDCARD, resolve};
use crate::model::EvaluationContext;
use crate::policy::RulePolicy;
use crate::rules::{Rule, RuleError};
use crate::verdict::{Verdict, Violation};
use crate::walker::{self, IAM_ROLE, StatementEntry};
use serde_json::json;
use stackguard_types::ids;

pub struct NoWildIamRoleStatements;

#[derive(Clone, Copy)]
enum Field {
    Action,
    Resource,
}

impl Field {
    fn name(self) -> &'static str {
        match self {
            Field::Action => "Action",
            Field::Resource => "Resource",
        }
    }

    fn plural(self) -> &'static str {
        match self {
            Field::Action => "actions",
            Field::Resource => "resources",
        }
    }

    fn is_wildcard(self, value: &str) -> bool {
        match self {
            Field::Action => value == WILDCARD || value.ends_with(":*"),
            Field::Resource => value == WILDCARD,
        }
    }

    fn wildcard_code(self) -> &'static str {
        match self {
            Field::Action => ids::CODE_WILDCARD_ACTION,
            Field::Resource => ids::CODE_WILDCARD_RESOURCE,
        }
    }

    fn unresolved_code(self) -> &'static str {
        match self {
            Field::Action => ids::CODE_UNRESOLVED_ACTION,
            Field::Resource => ids::CODE_UNRESOLVED_RESOURCE,
        }
    }

    fn help(self) -> &'static str {
        match self {
            Field::Action => "Grant the specific actions the role needs.",
            Field::Resource => "Scope the statement to explicit resource ARNs.",
        }
    }
}

impl Rule for NoWildIamRoleStatements {
    fn id(&self) -> &'static str {
        ids::RULE_NO_WILD_IAM_ROLE_STATEMENTS
    }

    fn evaluate(
        &self,
        ctx: &EvaluationContext,
        policy: &RulePolicy,
    ) -> Result<Vec<Verdict>, RuleError> {
        let mut out = Vec::new();

        for (logical_id, resource) in walker::select_by_type(&ctx.template, IAM_ROLE) {
            let before = out.len();

            for statement in walker::iam_inline_statements(logical_id, resource) {
                for entry in &statement.actions {
                    check_entry(logical_id, entry, Field::Action, policy, &mut out);
                }
                for entry in &statement.resources {
                    check_entry(logical_id, entry, Field::Resource, policy, &mut out);
                }
            }

            if out.len() == before {
                out.push(Verdict::Approved);
            }
        }

        Ok(out)
    }
}

fn check_entry(
    logical_id: &str,
    entry: &StatementEntry<'_>,
    field: Field,
    policy: &RulePolicy,
    out: &mut Vec<Verdict>,
) {
    let resolved = resolve(entry.value);

    for value in resolved.values().filter(|v| field.is_wildcard(v)) {
        let violation = Violation::new(
            field.wildcard_code(),
            format!(
                "iamRoleStatement granting {}='{}'. Wildcard {} in iamRoleStatements are not permitted.",
                field.name(),
                value,
                field.plural()
            ),
        )
        .at(logical_id, entry.pointer.clone())
        .subject(value)
        .help(field.help())
        .data(json!({
            "role": logical_id,
            "field": field.name(),
            "value": value,
        }));
        out.push(Verdict::Failed(violation));
    }

    // Fail-open by default: deploy-time values are not second-guessed.
    if resolved.has_unresolved() && policy.fail_closed {
        let described = entry.value.describe();
        let violation = Violation::new(
            field.unresolved_code(),
            format!(
                "iamRoleStatement granting {} from {}, which cannot be resolved before deployment. Unresolved {} in iamRoleStatements are not permitted.",
                field.name(),
                described,
                field.plural()
            ),
        )
        .at(logical_id, entry.pointer.clone())
        .help("Use literal values or disable fail_closed for this rule.")
        .data(json!({
            "role": logical_id,
            "field": field.name(),
            "value": described,
        }));
        out.push(Verdict::Failed(violation));
    }
}
