use anyhow::Context;
use stackguard_render::{
    RenderableData, RenderableFinding, RenderableLocation, RenderableReport, RenderableRule,
    RenderableRuleStatus, RenderableSeverity, RenderableVerdictStatus,
};
use stackguard_types::{
    Finding, RuleStatus, RunMeta, SCHEMA_REPORT_V1, Severity, StackguardData, StackguardReport,
    ToolMeta, VerdictCounts, VerdictStatus, VerdictSummary, ids,
};
use time::OffsetDateTime;

pub fn parse_report_json(text: &str) -> anyhow::Result<StackguardReport> {
    let value: serde_json::Value = serde_json::from_str(text).context("parse report json")?;

    let schema = value
        .get("schema")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    if schema != SCHEMA_REPORT_V1 {
        anyhow::bail!("unknown report schema: {schema} (expected {SCHEMA_REPORT_V1})");
    }

    serde_json::from_value(value).context("parse stackguard report")
}

pub fn serialize_report(report: &StackguardReport) -> anyhow::Result<Vec<u8>> {
    serde_json::to_vec_pretty(report).context("serialize report")
}

pub fn to_renderable(report: &StackguardReport) -> RenderableReport {
    RenderableReport {
        verdict: match report.verdict.status {
            VerdictStatus::Pass => RenderableVerdictStatus::Pass,
            VerdictStatus::Warn => RenderableVerdictStatus::Warn,
            VerdictStatus::Fail => RenderableVerdictStatus::Fail,
        },
        findings: report.findings.iter().map(renderable_finding).collect(),
        rules: report
            .rules
            .iter()
            .map(|r| RenderableRule {
                rule_id: r.rule_id.clone(),
                status: match r.status {
                    RuleStatus::Approved => RenderableRuleStatus::Approved,
                    RuleStatus::Failed => RenderableRuleStatus::Failed,
                    RuleStatus::Errored => RenderableRuleStatus::Errored,
                },
                approvals: r.approvals,
                failures: r.failures,
            })
            .collect(),
        data: RenderableData {
            template: report.data.template.clone(),
            profile: report.data.profile.clone(),
            findings_total: report.data.findings_total,
            rules_evaluated: report.data.rules_evaluated,
            rules_skipped: report.data.rules_skipped,
        },
    }
}

fn renderable_finding(f: &Finding) -> RenderableFinding {
    RenderableFinding {
        severity: match f.severity {
            Severity::Info => RenderableSeverity::Info,
            Severity::Warning => RenderableSeverity::Warning,
            Severity::Error => RenderableSeverity::Error,
        },
        rule_id: Some(f.rule_id.clone()),
        code: f.code.clone(),
        message: f.message.clone(),
        location: f.location.as_ref().map(|loc| RenderableLocation {
            resource: loc.resource.clone(),
            pointer: loc.pointer.as_ref().map(|p| p.as_str().to_string()),
        }),
        help: f.help.clone(),
    }
}

/// Report written when the tool itself failed (unreadable template, bad config).
pub fn runtime_error_report(message: &str) -> StackguardReport {
    let now = OffsetDateTime::now_utc();

    StackguardReport {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: ToolMeta {
            name: "stackguard".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        run: RunMeta {
            started_at: now,
            ended_at: now,
            duration_ms: 0,
        },
        verdict: VerdictSummary {
            status: VerdictStatus::Fail,
            counts: VerdictCounts {
                info: 0,
                warning: 0,
                error: 1,
            },
            reasons: vec![ids::CHECK_TOOL_RUNTIME.to_string()],
        },
        findings: vec![Finding {
            severity: Severity::Error,
            rule_id: ids::CHECK_TOOL_RUNTIME.to_string(),
            code: ids::CODE_RUNTIME_ERROR.to_string(),
            message: message.to_string(),
            location: None,
            help: Some("Fix the tool error and re-run stackguard.".to_string()),
            fingerprint: None,
            data: serde_json::Value::Null,
        }],
        rules: Vec::new(),
        data: StackguardData {
            profile: "unknown".to_string(),
            findings_total: 1,
            ..StackguardData::default()
        },
    }
}
