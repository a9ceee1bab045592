use crate::model::EvaluationContext;
use crate::policy::RulePolicy;
use crate::verdict::Verdict;
use thiserror::Error;

mod allowed_regions;
mod allowed_runtimes;
mod allowed_stages;
mod no_secret_env_vars;
mod no_wild_iam_role_statements;
mod require_dlq;
mod utils;


pub use allowed_regions::AllowedRegions;
pub use allowed_runtimes::AllowedRuntimes;
pub use allowed_stages::AllowedStages;
pub use no_secret_env_vars::NoSecretEnvVars;
pub use no_wild_iam_role_statements::NoWildIamRoleStatements;
pub use require_dlq::RequireDlq;

/// Why a rule could not produce verdicts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("rule requires at least one `allow` pattern")]
    MissingAllowlist,
    #[error("invalid allow pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// One safeguard.
///
/// Rules are stateless: everything they need arrives through the context and the policy, and
/// everything they conclude is returned.
pub trait Rule: Send + Sync {
    fn id(&self) -> &'static str;

    fn evaluate(
        &self,
        ctx: &EvaluationContext,
        policy: &RulePolicy,
    ) -> Result<Vec<Verdict>, RuleError>;
}

/// Built-in rules in declaration order.
pub fn catalog() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(NoWildIamRoleStatements),
        Box::new(NoSecretEnvVars),
        Box::new(AllowedRuntimes),
        Box::new(AllowedRegions),
        Box::new(AllowedStages),
        Box::new(RequireDlq),
    ]
}
