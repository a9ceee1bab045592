use crate::model::{SCHEMA_CONFIG_V1, StackguardConfigV1};
use crate::presets::{self, PROFILES};
use anyhow::Context;
use globset::Glob;
use stackguard_domain::policy::{EffectiveConfig, FailOn, RulePolicy};
use stackguard_types::{Severity, ids};

#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub profile: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub effective: EffectiveConfig,
}

pub fn resolve_config(
    cfg: StackguardConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    if let Some(schema) = cfg.schema.as_deref()
        && schema != SCHEMA_CONFIG_V1
    {
        anyhow::bail!("unsupported config schema: {schema} (expected {SCHEMA_CONFIG_V1})");
    }

    let profile = overrides
        .profile
        .or(cfg.profile)
        .unwrap_or_else(|| "strict".to_string());

    let mut effective = presets::preset(&profile).with_context(|| {
        format!(
            "unknown profile: {profile} (expected one of {})",
            PROFILES.join("|")
        )
    })?;

    // per-rule overrides
    for (rule_id, rc) in cfg.rules.iter() {
        if !ids::is_known_rule(rule_id) {
            anyhow::bail!(
                "unknown rule id in config: {rule_id} (known: {})",
                ids::ALL_RULE_IDS.join(", ")
            );
        }

        let entry = effective
            .rules
            .entry(rule_id.clone())
            .or_insert_with(RulePolicy::disabled);

        if let Some(enabled) = rc.enabled {
            entry.enabled = enabled;
        }
        if let Some(sev) = rc.severity.as_deref() {
            entry.severity =
                parse_severity(sev).with_context(|| format!("invalid severity for {rule_id}"))?;
        }
        if let Some(allow) = &rc.allow {
            validate_allowlist(rule_id, allow)?;
            entry.allow = allow.clone();
        }
        if let Some(fail_closed) = rc.fail_closed {
            entry.fail_closed = fail_closed;
        }
    }

    // fail_on override from config
    if let Some(fail_on_s) = cfg.fail_on.as_deref() {
        effective.fail_on = parse_fail_on(fail_on_s)?;
    }

    Ok(ResolvedConfig { effective })
}

fn validate_allowlist(rule_id: &str, patterns: &[String]) -> anyhow::Result<()> {
    for pattern in patterns {
        Glob::new(pattern)
            .with_context(|| format!("invalid allow glob for {rule_id}: {pattern}"))?;
    }
    Ok(())
}

fn parse_severity(v: &str) -> anyhow::Result<Severity> {
    match v {
        "info" => Ok(Severity::Info),
        "warning" | "warn" => Ok(Severity::Warning),
        "error" => Ok(Severity::Error),
        other => anyhow::bail!("unknown severity: {other} (expected info|warning|error)"),
    }
}

fn parse_fail_on(v: &str) -> anyhow::Result<FailOn> {
    match v {
        "error" => Ok(FailOn::Error),
        "warning" | "warn" => Ok(FailOn::Warning),
        other => anyhow::bail!("unknown fail_on: {other} (expected error|warning)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_config_toml;

    fn resolve(toml: &str) -> anyhow::Result<EffectiveConfig> {
        let cfg = parse_config_toml(toml)?;
        Ok(resolve_config(cfg, Overrides::default())?.effective)
    }

    #[test]
    fn empty_config_is_strict_preset() {
        let eff = resolve("").expect("resolve");
        assert_eq!(eff.profile, "strict");
        assert_eq!(eff.fail_on, FailOn::Error);

        let wild = eff
            .rule_policy(ids::RULE_NO_WILD_IAM_ROLE_STATEMENTS)
            .expect("enabled");
        assert_eq!(wild.severity, Severity::Error);
        assert!(!wild.fail_closed);

        assert!(
            !eff.rule_policy(ids::RULE_ALLOWED_RUNTIMES)
                .expect("enabled")
                .allow
                .is_empty()
        );
        assert!(eff.rule_policy(ids::RULE_ALLOWED_STAGES).is_none());
        assert!(eff.rule_policy(ids::RULE_REQUIRE_DLQ).is_none());
    }

    #[test]
    fn rule_entries_override_preset() {
        let eff = resolve(
            r#"
profile = "warn"
fail_on = "warning"

[rules.allowed-stages]
enabled = true
allow = ["dev", "prod"]
fail_closed = true

[rules.no-wild-iam-role-statements]
severity = "error"
"#,
        )
        .expect("resolve");

        assert_eq!(eff.profile, "warn");
        assert_eq!(eff.fail_on, FailOn::Warning);

        let stages = eff.rule_policy(ids::RULE_ALLOWED_STAGES).expect("enabled");
        assert_eq!(stages.allow, vec!["dev".to_string(), "prod".to_string()]);
        assert!(stages.fail_closed);
        assert_eq!(stages.severity, Severity::Warning);

        let wild = eff
            .rule_policy(ids::RULE_NO_WILD_IAM_ROLE_STATEMENTS)
            .expect("enabled");
        assert_eq!(wild.severity, Severity::Error);
    }

    #[test]
    fn cli_profile_wins_over_config() {
        let cfg = parse_config_toml(r#"profile = "strict""#).expect("parse");
        let eff = resolve_config(
            cfg,
            Overrides {
                profile: Some("warn".to_string()),
            },
        )
        .expect("resolve")
        .effective;
        assert_eq!(eff.profile, "warn");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let unknown_rule = resolve("[rules.no-such-rule]\nenabled = true\n").expect_err("rule");
        assert!(unknown_rule.to_string().contains("no-such-rule"));

        assert!(resolve(r#"profile = "lenient""#).is_err());
        assert!(resolve(r#"fail_on = "never""#).is_err());
        assert!(resolve(r#"schema = "stackguard.config.v9""#).is_err());
        assert!(resolve("[rules.require-dlq]\nseverity = \"fatal\"\n").is_err());
        assert!(resolve("[rules.allowed-regions]\nallow = [\"[\"]\n").is_err());
    }
}
