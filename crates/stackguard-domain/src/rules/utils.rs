use crate::rules::RuleError;
use globset::{Glob, GlobSet, GlobSetBuilder};

pub fn build_allowlist(allow: &[String]) -> Result<Option<GlobSet>, RuleError> {
    if allow.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in allow {
        // Treat allowlist entries as glob patterns (case-sensitive).
        let glob = Glob::new(pattern).map_err(|e| RuleError::InvalidPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map(Some)
        .map_err(|e| RuleError::InvalidPattern {
            pattern: allow.join(","),
            message: e.to_string(),
        })
}

/// Allowlist for rules that mean nothing without one.
pub fn require_allowlist(allow: &[String]) -> Result<GlobSet, RuleError> {
    build_allowlist(allow)?.ok_or(RuleError::MissingAllowlist)
}

pub fn is_allowed(allow: Option<&GlobSet>, value: &str) -> bool {
    allow.map(|set| set.is_match(value)).unwrap_or(false)
}

pub fn allow_list_text(allow: &[String]) -> String {
    allow.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_allowlist_is_none() {
        assert!(build_allowlist(&[]).expect("ok").is_none());
        assert_eq!(
            require_allowlist(&[]).err(),
            Some(RuleError::MissingAllowlist)
        );
    }

    #[test]
    fn globs_match() {
        let set = build_allowlist(&["nodejs*".to_string()]).expect("ok");
        assert!(is_allowed(set.as_ref(), "nodejs20.x"));
        assert!(!is_allowed(set.as_ref(), "python3.12"));
        assert!(!is_allowed(None, "anything"));
    }

    #[test]
    fn invalid_glob_is_reported() {
        let err = build_allowlist(&["[".to_string()]).expect_err("invalid");
        assert!(matches!(err, RuleError::InvalidPattern { ref pattern, .. } if pattern == "["));
    }
}
