//! Stable identifiers for rules and finding codes.
//!
//! `rule_id` is the kebab-case safeguard name used in configuration. `code` is a short
//! snake_case discriminator.

// Rules
pub const RULE_NO_WILD_IAM_ROLE_STATEMENTS: &str = "no-wild-iam-role-statements";
pub const RULE_NO_SECRET_ENV_VARS: &str = "no-secret-env-vars";
pub const RULE_ALLOWED_RUNTIMES: &str = "allowed-runtimes";
pub const RULE_ALLOWED_REGIONS: &str = "allowed-regions";
pub const RULE_ALLOWED_STAGES: &str = "allowed-stages";
pub const RULE_REQUIRE_DLQ: &str = "require-dlq";

// Codes: no-wild-iam-role-statements
pub const CODE_WILDCARD_ACTION: &str = "wildcard_action";
pub const CODE_WILDCARD_RESOURCE: &str = "wildcard_resource";
pub const CODE_UNRESOLVED_ACTION: &str = "unresolved_action";
pub const CODE_UNRESOLVED_RESOURCE: &str = "unresolved_resource";

// Codes: no-secret-env-vars
pub const CODE_SECRET_ENV_VAR: &str = "secret_env_var";
pub const CODE_UNRESOLVED_ENV_VAR: &str = "unresolved_env_var";

// Codes: allowed-runtimes
pub const CODE_RUNTIME_NOT_ALLOWED: &str = "runtime_not_allowed";
pub const CODE_UNRESOLVED_RUNTIME: &str = "unresolved_runtime";

// Codes: allowed-regions
pub const CODE_REGION_NOT_ALLOWED: &str = "region_not_allowed";
pub const CODE_UNKNOWN_REGION: &str = "unknown_region";

// Codes: allowed-stages
pub const CODE_STAGE_NOT_ALLOWED: &str = "stage_not_allowed";
pub const CODE_UNKNOWN_STAGE: &str = "unknown_stage";

// Codes: require-dlq
pub const CODE_MISSING_DLQ: &str = "missing_dlq";
pub const CODE_UNRESOLVED_DLQ: &str = "unresolved_dlq";

// Emitted by the runner for any rule that failed to evaluate.
pub const CODE_RULE_ERRORED: &str = "rule_errored";

// Tool-level
pub const CHECK_TOOL_RUNTIME: &str = "tool.runtime";
pub const CODE_RUNTIME_ERROR: &str = "runtime_error";

/// All rule IDs in declaration order (the order the runner evaluates them in).
pub const ALL_RULE_IDS: &[&str] = &[
    RULE_NO_WILD_IAM_ROLE_STATEMENTS,
    RULE_NO_SECRET_ENV_VARS,
    RULE_ALLOWED_RUNTIMES,
    RULE_ALLOWED_REGIONS,
    RULE_ALLOWED_STAGES,
    RULE_REQUIRE_DLQ,
];

pub fn is_known_rule(rule_id: &str) -> bool {
    ALL_RULE_IDS.contains(&rule_id)
}

/// Codes each rule can emit. `rule_errored` belongs to the runner, not to a rule.
const RULE_CODES: &[(&str, &[&str])] = &[
    (
        RULE_NO_WILD_IAM_ROLE_STATEMENTS,
        &[
            CODE_WILDCARD_ACTION,
            CODE_WILDCARD_RESOURCE,
            CODE_UNRESOLVED_ACTION,
            CODE_UNRESOLVED_RESOURCE,
        ],
    ),
    (
        RULE_NO_SECRET_ENV_VARS,
        &[CODE_SECRET_ENV_VAR, CODE_UNRESOLVED_ENV_VAR],
    ),
    (
        RULE_ALLOWED_RUNTIMES,
        &[CODE_RUNTIME_NOT_ALLOWED, CODE_UNRESOLVED_RUNTIME],
    ),
    (
        RULE_ALLOWED_REGIONS,
        &[CODE_REGION_NOT_ALLOWED, CODE_UNKNOWN_REGION],
    ),
    (
        RULE_ALLOWED_STAGES,
        &[CODE_STAGE_NOT_ALLOWED, CODE_UNKNOWN_STAGE],
    ),
    (RULE_REQUIRE_DLQ, &[CODE_MISSING_DLQ, CODE_UNRESOLVED_DLQ]),
];

pub fn codes_for_rule(rule_id: &str) -> &'static [&'static str] {
    RULE_CODES
        .iter()
        .find(|(id, _)| *id == rule_id)
        .map(|(_, codes)| *codes)
        .unwrap_or_default()
}

pub fn rule_for_code(code: &str) -> Option<&'static str> {
    RULE_CODES
        .iter()
        .find(|(_, codes)| codes.contains(&code))
        .map(|(id, _)| *id)
}
