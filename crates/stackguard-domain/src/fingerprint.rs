use sha2::{Digest, Sha256};

/// Compute a stable SHA-256 fingerprint for a finding.
///
/// Identity fields:
/// - rule_id
/// - code
/// - resource logical ID (empty for deployment-level findings)
/// - property pointer (empty when absent)
/// - offending value (empty when absent); one pointer may resolve to several
pub fn fingerprint_for_finding(
    rule_id: &str,
    code: &str,
    resource: Option<&str>,
    pointer: Option<&str>,
    subject: Option<&str>,
) -> String {
    let canonical = [
        rule_id,
        code,
        resource.unwrap_or_default(),
        pointer.unwrap_or_default(),
        subject.unwrap_or_default(),
    ]
    .join("|");

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_and_field_sensitive() {
        let a = fingerprint_for_finding("r", "c", Some("Role"), Some("/Resources/Role"), None);
        let b = fingerprint_for_finding("r", "c", Some("Role"), Some("/Resources/Role"), None);
        let c = fingerprint_for_finding("r", "c", Some("Role"), None, None);
        let d = fingerprint_for_finding("r", "c", Some("Role"), Some("/Resources/Role"), Some("*"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(a.len(), 64);
    }
}
