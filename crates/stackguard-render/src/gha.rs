use crate::{RenderableReport, RenderableSeverity};

/// Render findings as GitHub Actions workflow command annotations.
///
/// Format:
/// `::{level} file={template},title={resource}::[{rule_id}:{code}] {message}`
pub fn render_github_annotations(report: &RenderableReport) -> Vec<String> {
    let mut out = Vec::new();

    for f in &report.findings {
        let level = match f.severity {
            RenderableSeverity::Error => "error",
            RenderableSeverity::Warning => "warning",
            RenderableSeverity::Info => "notice",
        };

        let mut meta = Vec::new();
        if let Some(template) = &report.data.template {
            meta.push(format!("file={}", escape_property(template)));
        }
        if let Some(loc) = &f.location {
            meta.push(format!("title={}", escape_property(&loc.resource)));
        }

        let rule_id = f.rule_id.as_deref().unwrap_or("stackguard");
        let message = escape_data(&format!("[{}:{}] {}", rule_id, f.code, f.message));

        if meta.is_empty() {
            out.push(format!("::{}::{}", level, message));
        } else {
            out.push(format!("::{} {}::{}", level, meta.join(","), message));
        }
    }

    out
}

fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}
