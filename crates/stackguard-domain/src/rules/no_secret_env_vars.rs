use crate::intrinsic::resolve;
use crate::model::EvaluationContext;
use crate::policy::RulePolicy;
use crate::rules::utils::{build_allowlist, is_allowed};
use crate::rules::{Rule, RuleError};
use crate::verdict::{Verdict, Violation};
use crate::walker::{self, LAMBDA_FUNCTION};
use regex::Regex;
use serde_json::json;
use stackguard_types::{PropertyPointer, ids};
use std::sync::LazyLock;

pub struct NoSecretEnvVars;

struct SecretShape {
    kind: &'static str,
    pattern: Regex,
    /// Only applies when the variable name also looks secret.
    needs_secret_name: bool,
}

fn shape(kind: &'static str, pattern: &str, needs_secret_name: bool) -> SecretShape {
    SecretShape {
        kind,
        pattern: Regex::new(pattern).expect("built-in secret pattern must compile"),
        needs_secret_name,
    }
}

static SHAPES: LazyLock<Vec<SecretShape>> = LazyLock::new(|| {
    vec![
        shape("aws access key id", r"\b(AKIA|ASIA)[0-9A-Z]{16}\b", false),
        shape(
            "private key",
            r"-----BEGIN ([A-Z]+ )?PRIVATE KEY-----",
            false,
        ),
        shape("slack token", r"\bxox[abprs]-[0-9A-Za-z-]{10,}", false),
        shape("github token", r"\bgh[pousr]_[0-9A-Za-z]{36}\b", false),
        shape("stripe secret key", r"\b[rs]k_live_[0-9A-Za-z]{24,}\b", false),
        shape("aws secret access key", r"^[0-9A-Za-z/+]{40}$", true),
    ]
});

static SECRET_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(secret|password|passwd|token|private|credential|api_?key)")
        .expect("built-in name pattern must compile")
});

fn classify(name: &str, value: &str) -> Option<&'static str> {
    let secret_name = SECRET_NAME.is_match(name);
    SHAPES
        .iter()
        .filter(|s| secret_name || !s.needs_secret_name)
        .find(|s| s.pattern.is_match(value))
        .map(|s| s.kind)
}

impl Rule for NoSecretEnvVars {
    fn id(&self) -> &'static str {
        ids::RULE_NO_SECRET_ENV_VARS
    }

    fn evaluate(
        &self,
        ctx: &EvaluationContext,
        policy: &RulePolicy,
    ) -> Result<Vec<Verdict>, RuleError> {
        let allow = build_allowlist(&policy.allow)?;
        let mut out = Vec::new();

        for (logical_id, function) in walker::select_by_type(&ctx.template, LAMBDA_FUNCTION) {
            let before = out.len();
            let variables = walker::property(function, &["Environment", "Variables"])
                .and_then(|v| v.as_map());

            for (name, value) in variables.into_iter().flatten() {
                if is_allowed(allow.as_ref(), name) {
                    continue;
                }
                let pointer =
                    PropertyPointer::property(logical_id, &["Environment", "Variables", name]);
                let resolved = resolve(value);

                if let Some(kind) = resolved.values().find_map(|v| classify(name, v)) {
                    out.push(Verdict::Failed(
                        Violation::new(
                            ids::CODE_SECRET_ENV_VAR,
                            format!(
                                "Environment variable {name} on function '{logical_id}' looks like it contains a secret value ({kind})."
                            ),
                        )
                        .at(logical_id, pointer)
                        .help("Store the secret in a secret manager and pass a reference instead.")
                        .data(json!({
                            "function": logical_id,
                            "variable": name,
                            "kind": kind,
                        })),
                    ));
                } else if resolved.has_unresolved() && policy.fail_closed {
                    // Deploy-time values are references, not embedded secrets, unless closed.
                    out.push(Verdict::Failed(
                        Violation::new(
                            ids::CODE_UNRESOLVED_ENV_VAR,
                            format!(
                                "Environment variable {name} on function '{logical_id}' comes from {}, which cannot be resolved before deployment.",
                                value.describe()
                            ),
                        )
                        .at(logical_id, pointer)
                        .help("Use a literal value, allowlist the variable name, or disable fail_closed for this rule.")
                        .data(json!({
                            "function": logical_id,
                            "variable": name,
                        })),
                    ));
                }
            }

            if out.len() == before {
                out.push(Verdict::Approved);
            }
        }

        Ok(out)
    }
}
