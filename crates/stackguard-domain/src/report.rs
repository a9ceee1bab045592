use crate::verdict::{RuleOutcome, RuleStatus};
use stackguard_types::{
    Finding, RuleStatus as ReportedStatus, RuleSummary, Severity, StackguardData, VerdictStatus,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub info: u32,
    pub warning: u32,
    pub error: u32,
}

impl SeverityCounts {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mut counts = SeverityCounts::default();
        for f in findings {
            match f.severity {
                Severity::Info => counts.info += 1,
                Severity::Warning => counts.warning += 1,
                Severity::Error => counts.error += 1,
            }
        }
        counts
    }
}

#[derive(Clone, Debug)]
pub struct DomainReport {
    pub status: VerdictStatus,
    /// Rule declaration order, then traversal order within each rule.
    pub findings: Vec<Finding>,
    /// One entry per evaluated rule; disabled rules are absent.
    pub outcomes: Vec<RuleOutcome>,
    pub data: StackguardData,
    pub counts: SeverityCounts,
}

impl DomainReport {
    pub fn passed(&self) -> bool {
        self.status != VerdictStatus::Fail
    }

    /// Every failure string, each independently actionable.
    pub fn failure_messages(&self) -> Vec<&str> {
        self.findings.iter().map(|f| f.message.as_str()).collect()
    }

    /// Rule IDs with at least one finding, without repeats, in evaluation order.
    pub fn reasons(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for f in &self.findings {
            if !out.contains(&f.rule_id) {
                out.push(f.rule_id.clone());
            }
        }
        out
    }

    pub fn rule_summaries(&self) -> Vec<RuleSummary> {
        self.outcomes
            .iter()
            .map(|o| {
                let (status, error) = match &o.status {
                    RuleStatus::Errored(message) => (ReportedStatus::Errored, Some(message.clone())),
                    RuleStatus::Evaluated(_) if o.failures() > 0 => (ReportedStatus::Failed, None),
                    RuleStatus::Evaluated(_) => (ReportedStatus::Approved, None),
                };
                RuleSummary {
                    rule_id: o.rule_id.to_string(),
                    status,
                    approvals: o.approvals() as u32,
                    failures: o.failures() as u32,
                    error,
                }
            })
            .collect()
    }
}
