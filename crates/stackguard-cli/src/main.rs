//! CLI entry point for stackguard.
//!
//! This module is intentionally thin: it handles argument parsing, I/O, logging setup, and exit
//! codes. All business logic lives in the `stackguard-app` crate.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand, ValueEnum};
use stackguard_app::{
    CheckInput, ExplainOutput, TemplateFormat, format_explanation, format_not_found,
    parse_report_json, render_annotations, render_markdown, run_check, run_explain,
    runtime_error_report, serialize_report, to_renderable, verdict_exit_code,
};
use stackguard_domain::model::DeploymentMeta;
use stackguard_settings::{Overrides, ResolvedConfig, StackguardConfigV1};
use stackguard_types::{StackguardReport, explain};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "stackguard",
    version,
    about = "Safeguard policy checks for compiled infrastructure templates"
)]
struct Cli {
    /// Path to stackguard config TOML (a missing file means defaults).
    #[arg(long, global = true, default_value = "stackguard.toml")]
    config: Utf8PathBuf,

    /// Override profile (strict|warn).
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Debug logging on stderr (otherwise `STACKGUARD_LOG`, default `warn`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Auto,
    Json,
    Yaml,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SchemaKind {
    Report,
    Config,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate the safeguards against a compiled template and write artifacts.
    Check {
        /// Compiled template (JSON or YAML); `-` reads stdin.
        #[arg(long, short)]
        template: Utf8PathBuf,

        /// Template encoding (default: from the file extension, then content).
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Service name, recorded in the report.
        #[arg(long)]
        service: Option<String>,

        /// Deployment stage (checked by allowed-stages).
        #[arg(long)]
        stage: Option<String>,

        /// Deployment region (checked by allowed-regions).
        #[arg(long)]
        region: Option<String>,

        /// Where to write the JSON report.
        #[arg(long, default_value = "artifacts/stackguard/report.json")]
        report_out: Utf8PathBuf,

        /// Write a Markdown report alongside the JSON.
        #[arg(long)]
        write_markdown: bool,

        /// Where to write the Markdown report (if enabled).
        #[arg(long, default_value = "artifacts/stackguard/comment.md")]
        markdown_out: Utf8PathBuf,
    },

    /// Render markdown from an existing JSON report.
    Md {
        /// Path to the JSON report file.
        #[arg(long, default_value = "artifacts/stackguard/report.json")]
        report: Utf8PathBuf,

        /// Where to write the Markdown output (if not specified, prints to stdout).
        #[arg(long, short)]
        output: Option<Utf8PathBuf>,
    },

    /// Render GitHub Actions annotations from an existing JSON report.
    Annotations {
        /// Path to the JSON report file.
        #[arg(long, default_value = "artifacts/stackguard/report.json")]
        report: Utf8PathBuf,

        /// Maximum number of annotations to emit (default 10, per GHA best practices).
        #[arg(long, default_value = "10")]
        max: usize,
    },

    /// Explain a rule_id or code: its codes, its state under the active config, remediation.
    Explain {
        /// The rule_id (e.g., "no-wild-iam-role-statements") or code (e.g., "wildcard_action").
        identifier: String,
    },

    /// List rules and whether the resolved configuration enables them.
    Rules,

    /// Print the JSON schema of the report or the config file.
    Schema {
        #[arg(value_enum, default_value = "report")]
        kind: SchemaKind,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.cmd {
        Commands::Check {
            ref template,
            format,
            ref service,
            ref stage,
            ref region,
            ref report_out,
            write_markdown,
            ref markdown_out,
        } => cmd_check(
            &cli,
            template,
            format,
            DeploymentMeta {
                service: service.clone(),
                stage: stage.clone(),
                region: region.clone(),
            },
            report_out,
            write_markdown.then_some(markdown_out.as_path()),
        ),
        Commands::Md { ref report, ref output } => cmd_md(report, output.as_deref()),
        Commands::Annotations { ref report, max } => cmd_annotations(report, max),
        Commands::Explain { ref identifier } => cmd_explain(&cli, identifier),
        Commands::Rules => cmd_rules(&cli),
        Commands::Schema { kind } => cmd_schema(kind),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("STACKGUARD_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_check(
    cli: &Cli,
    template: &Utf8Path,
    format: Option<FormatArg>,
    meta: DeploymentMeta,
    report_out: &Utf8Path,
    markdown_out: Option<&Utf8Path>,
) -> anyhow::Result<()> {
    let result = (|| -> anyhow::Result<i32> {
        let template_text = read_template(template)?;
        let config_text = read_config(&cli.config)?;

        let format = match format {
            Some(FormatArg::Json) => TemplateFormat::Json,
            Some(FormatArg::Yaml) => TemplateFormat::Yaml,
            Some(FormatArg::Auto) => TemplateFormat::Auto,
            None => TemplateFormat::from_path(template.as_str()),
        };

        let input = CheckInput {
            template_text: &template_text,
            template_name: Some(template.as_str()),
            format,
            config_text: &config_text,
            overrides: Overrides {
                profile: cli.profile.clone(),
            },
            meta,
        };

        let output = run_check(input)?;

        write_report_file(report_out, &output.report).context("write report json")?;

        if let Some(markdown_out) = markdown_out {
            let md = render_markdown(&to_renderable(&output.report));
            write_text_file(markdown_out, &md).context("write markdown")?;
        }

        print_failures(&output.report);
        Ok(verdict_exit_code(output.report.verdict.status))
    })();

    match result {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Err(err) => {
            let report = runtime_error_report(&format!("{err:#}"));
            if let Err(write_err) = write_report_file(report_out, &report) {
                tracing::warn!(error = %write_err, "could not write error report");
            }
            eprintln!("stackguard error: {err:#}");
            std::process::exit(1);
        }
    }
}

/// Every failure on stderr, one per line, so a failing CI step explains itself.
fn print_failures(report: &StackguardReport) {
    if report.findings.is_empty() {
        return;
    }
    eprintln!(
        "stackguard: {} finding(s) ({:?})",
        report.findings.len(),
        report.verdict.status
    );
    for f in &report.findings {
        eprintln!("  - [{}] {}", f.rule_id, f.message);
    }
}

fn read_template(path: &Utf8Path) -> anyhow::Result<String> {
    if path.as_str() == "-" {
        return std::io::read_to_string(std::io::stdin()).context("read template from stdin");
    }
    std::fs::read_to_string(path).with_context(|| format!("read template: {}", path))
}

/// Missing config is allowed (defaults apply).
fn read_config(path: &Utf8Path) -> anyhow::Result<String> {
    if !path.exists() {
        tracing::debug!(config = %path, "no config file, using defaults");
        return Ok(String::new());
    }
    std::fs::read_to_string(path).with_context(|| format!("read config: {}", path))
}

fn write_report_file(path: &Utf8Path, report: &StackguardReport) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {}", parent))?;
    }
    let data = serialize_report(report).context("serialize report")?;
    std::fs::write(path, data).with_context(|| format!("write report: {}", path))?;
    Ok(())
}

fn write_text_file(path: &Utf8Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {}", parent))?;
    }
    std::fs::write(path, text).with_context(|| format!("write text: {}", path))?;
    Ok(())
}

fn read_report(path: &Utf8Path) -> anyhow::Result<StackguardReport> {
    let report_text =
        std::fs::read_to_string(path).with_context(|| format!("read report: {}", path))?;
    parse_report_json(&report_text)
}

fn cmd_md(report_path: &Utf8Path, output: Option<&Utf8Path>) -> anyhow::Result<()> {
    let report = read_report(report_path)?;
    let md = render_markdown(&to_renderable(&report));

    if let Some(out_path) = output {
        write_text_file(out_path, &md).context("write markdown output")?;
    } else {
        print!("{}", md);
    }

    Ok(())
}

fn cmd_annotations(report_path: &Utf8Path, max: usize) -> anyhow::Result<()> {
    let report = read_report(report_path)?;
    for annotation in render_annotations(&to_renderable(&report), max) {
        println!("{}", annotation);
    }

    Ok(())
}

fn cmd_explain(cli: &Cli, identifier: &str) -> anyhow::Result<()> {
    let resolved = resolve_cli_config(cli)?;
    match run_explain(identifier, &resolved.effective) {
        ExplainOutput::Found(e) => {
            print!("{}", format_explanation(&e));
            Ok(())
        }
        ExplainOutput::NotFound { identifier } => {
            eprint!("{}", format_not_found(&identifier));
            std::process::exit(1);
        }
    }
}

/// Config file plus `--profile`, as `check` would see it.
fn resolve_cli_config(cli: &Cli) -> anyhow::Result<ResolvedConfig> {
    let config_text = read_config(&cli.config)?;
    let cfg = if config_text.trim().is_empty() {
        StackguardConfigV1::default()
    } else {
        stackguard_settings::parse_config_toml(&config_text).context("parse config")?
    };
    stackguard_settings::resolve_config(
        cfg,
        Overrides {
            profile: cli.profile.clone(),
        },
    )
    .context("resolve config")
}

fn cmd_rules(cli: &Cli) -> anyhow::Result<()> {
    let resolved = resolve_cli_config(cli)?;

    for rule_id in explain::all_rule_ids() {
        let state = match resolved.effective.rule_policy(rule_id) {
            Some(policy) => format!("{:?}", policy.severity).to_lowercase(),
            None => "off".to_string(),
        };
        let title = explain::lookup_explanation(rule_id)
            .map(|e| e.title)
            .unwrap_or_default();
        println!("{rule_id:<30} {state:<8} {title}");
    }

    Ok(())
}

fn cmd_schema(kind: SchemaKind) -> anyhow::Result<()> {
    let schema = match kind {
        SchemaKind::Report => schemars::schema_for!(StackguardReport),
        SchemaKind::Config => schemars::schema_for!(StackguardConfigV1),
    };
    let text = serde_json::to_string_pretty(&schema).context("serialize schema")?;
    println!("{text}");
    Ok(())
}
