use stackguard_types::Severity;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailOn {
    Error,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RulePolicy {
    pub enabled: bool,
    pub severity: Severity,
    /// Glob patterns (semantics are rule-specific).
    pub allow: Vec<String>,
    /// Treat values that cannot be resolved as violations instead of approving them.
    pub fail_closed: bool,
}

impl RulePolicy {
    pub fn enabled(severity: Severity) -> Self {
        Self {
            enabled: true,
            severity,
            allow: Vec::new(),
            fail_closed: false,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            severity: Severity::Error,
            allow: Vec::new(),
            fail_closed: false,
        }
    }

    pub fn with_allow<I, S>(mut self, allow: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow = allow.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Clone, Debug)]
pub struct EffectiveConfig {
    pub profile: String,
    pub fail_on: FailOn,
    pub rules: BTreeMap<String, RulePolicy>,
}

impl EffectiveConfig {
    /// The policy for `rule_id`, if the rule is enabled.
    pub fn rule_policy(&self, rule_id: &str) -> Option<&RulePolicy> {
        self.rules.get(rule_id).filter(|p| p.enabled)
    }
}
