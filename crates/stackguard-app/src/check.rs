//! The `check` use case: evaluate the safeguards and produce a report.

use crate::template::{TemplateFormat, load_template};
use anyhow::Context;
use stackguard_domain::model::{DeploymentMeta, EvaluationContext};
use stackguard_domain::report::DomainReport;
use stackguard_settings::{Overrides, ResolvedConfig, StackguardConfigV1};
use stackguard_types::{
    RunMeta, SCHEMA_REPORT_V1, StackguardReport, ToolMeta, VerdictCounts, VerdictStatus,
    VerdictSummary,
};
use time::OffsetDateTime;

/// Input for the check use case.
#[derive(Clone, Debug)]
pub struct CheckInput<'a> {
    /// Compiled template contents.
    pub template_text: &'a str,
    /// Template path as the user named it; recorded in the report.
    pub template_name: Option<&'a str>,
    pub format: TemplateFormat,
    /// Config file contents (empty string if not found).
    pub config_text: &'a str,
    /// CLI overrides.
    pub overrides: Overrides,
    /// Deployment metadata (service, stage, region).
    pub meta: DeploymentMeta,
}

/// Output from the check use case.
#[derive(Clone, Debug)]
pub struct CheckOutput {
    /// The generated report.
    pub report: StackguardReport,
    /// The resolved configuration used.
    pub resolved_config: ResolvedConfig,
}

/// Run the check use case: parse config, load the template, evaluate rules, produce report.
pub fn run_check(input: CheckInput<'_>) -> anyhow::Result<CheckOutput> {
    let started_at = OffsetDateTime::now_utc();

    // Parse config (empty is allowed, defaults apply).
    let cfg = if input.config_text.trim().is_empty() {
        StackguardConfigV1::default()
    } else {
        stackguard_settings::parse_config_toml(input.config_text).context("parse config")?
    };

    let resolved = stackguard_settings::resolve_config(cfg, input.overrides.clone())
        .context("resolve config")?;
    tracing::debug!(profile = %resolved.effective.profile, "config resolved");

    let template = load_template(input.template_text, input.format).context("load template")?;
    let ctx = EvaluationContext::new(template, input.meta.clone());

    let domain_report = stackguard_domain::evaluate(&ctx, &resolved.effective);
    let reasons = domain_report.reasons();
    let rules = domain_report.rule_summaries();
    let DomainReport {
        status,
        findings,
        data: mut domain_data,
        counts,
        ..
    } = domain_report;
    domain_data.template = input.template_name.map(str::to_string);

    tracing::info!(
        status = ?status,
        findings = findings.len(),
        "evaluation finished"
    );

    let ended_at = OffsetDateTime::now_utc();
    let duration_ms = (ended_at - started_at).whole_milliseconds().max(0) as u64;

    let report = StackguardReport {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: ToolMeta {
            name: "stackguard".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        run: RunMeta {
            started_at,
            ended_at,
            duration_ms,
        },
        verdict: VerdictSummary {
            status,
            counts: VerdictCounts {
                info: counts.info,
                warning: counts.warning,
                error: counts.error,
            },
            reasons,
        },
        findings,
        rules,
        data: domain_data,
    };

    Ok(CheckOutput {
        report,
        resolved_config: resolved,
    })
}

/// Map verdict to exit code: 0 = pass/warn, 2 = fail.
pub fn verdict_exit_code(status: VerdictStatus) -> i32 {
    match status {
        VerdictStatus::Pass => 0,
        VerdictStatus::Warn => 0,
        VerdictStatus::Fail => 2,
    }
}
