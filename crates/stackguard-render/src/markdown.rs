use crate::{RenderableReport, RenderableRuleStatus, RenderableSeverity, RenderableVerdictStatus};

pub fn render_markdown(report: &RenderableReport) -> String {
    let mut out = String::new();

    out.push_str("# Stackguard report\n\n");
    let verdict = match report.verdict {
        RenderableVerdictStatus::Pass => "PASS",
        RenderableVerdictStatus::Warn => "WARN",
        RenderableVerdictStatus::Fail => "FAIL",
    };
    out.push_str(&format!("- Verdict: **{}**\n", verdict));
    if let Some(template) = &report.data.template {
        out.push_str(&format!("- Template: `{}`\n", template));
    }
    out.push_str(&format!(
        "- Profile: {}\n- Findings: {}\n- Rules: {} evaluated / {} skipped\n\n",
        report.data.profile,
        report.data.findings_total,
        report.data.rules_evaluated,
        report.data.rules_skipped
    ));

    if !report.rules.is_empty() {
        out.push_str("| Rule | Status | Approved | Failed |\n|---|---|---|---|\n");
        for r in &report.rules {
            let status = match r.status {
                RenderableRuleStatus::Approved => "approved",
                RenderableRuleStatus::Failed => "failed",
                RenderableRuleStatus::Errored => "errored",
            };
            out.push_str(&format!(
                "| `{}` | {} | {} | {} |\n",
                r.rule_id, status, r.approvals, r.failures
            ));
        }
        out.push('\n');
    }

    if report.findings.is_empty() {
        out.push_str("No findings.\n");
        return out;
    }

    out.push_str("## Findings\n\n");

    for f in &report.findings {
        let sev = match f.severity {
            RenderableSeverity::Info => "INFO",
            RenderableSeverity::Warning => "WARN",
            RenderableSeverity::Error => "ERROR",
        };

        out.push_str(&format!(
            "- [{}] `{}` / `{}`: {}",
            sev,
            f.rule_id.as_deref().unwrap_or(""),
            f.code,
            f.message
        ));
        if let Some(loc) = &f.location {
            match &loc.pointer {
                Some(pointer) => out.push_str(&format!(" (`{}` at `{}`)", loc.resource, pointer)),
                None => out.push_str(&format!(" (`{}`)", loc.resource)),
            }
        }
        out.push('\n');

        if let Some(help) = &f.help {
            out.push_str(&format!("  - help: {}\n", help));
        }
    }

    out
}
