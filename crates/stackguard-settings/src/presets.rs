use stackguard_domain::policy::{EffectiveConfig, FailOn, RulePolicy};
use stackguard_types::Severity;
use stackguard_types::ids::*;
use std::collections::BTreeMap;

pub const PROFILES: &[&str] = &["strict", "warn"];

/// Runtimes accepted out of the box by `allowed-runtimes`.
const DEFAULT_RUNTIMES: &[&str] = &[
    "nodejs20.x",
    "nodejs22.x",
    "python3.11",
    "python3.12",
    "python3.13",
    "java17",
    "java21",
    "dotnet8",
    "ruby3.3",
    "provided.al2",
    "provided.al2023",
];

/// Preset profiles are opinionated defaults.
///
/// Keep these small and readable. Anything complex should go into repo config.
pub fn preset(profile: &str) -> Option<EffectiveConfig> {
    match profile {
        "strict" => Some(profile_with("strict", Severity::Error)),
        "warn" => Some(profile_with("warn", Severity::Warning)),
        _ => None,
    }
}

fn profile_with(name: &str, default_severity: Severity) -> EffectiveConfig {
    EffectiveConfig {
        profile: name.to_string(),
        fail_on: FailOn::Error,
        rules: default_rules(default_severity),
    }
}

fn default_rules(default_severity: Severity) -> BTreeMap<String, RulePolicy> {
    let mut m = BTreeMap::new();

    m.insert(
        RULE_NO_WILD_IAM_ROLE_STATEMENTS.to_string(),
        RulePolicy::enabled(default_severity),
    );
    m.insert(
        RULE_NO_SECRET_ENV_VARS.to_string(),
        RulePolicy::enabled(default_severity),
    );
    m.insert(
        RULE_ALLOWED_RUNTIMES.to_string(),
        RulePolicy::enabled(default_severity).with_allow(DEFAULT_RUNTIMES.iter().copied()),
    );

    // Opt-in: these need deployment-specific allowlists or are a matter of taste.
    for id in [RULE_ALLOWED_REGIONS, RULE_ALLOWED_STAGES, RULE_REQUIRE_DLQ] {
        m.insert(
            id.to_string(),
            RulePolicy {
                severity: default_severity,
                ..RulePolicy::disabled()
            },
        );
    }

    m
}
