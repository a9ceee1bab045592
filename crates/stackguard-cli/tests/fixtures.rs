//! End-to-end CLI integration tests using template fixtures.
//!
//! Each fixture in `tests/fixtures/` contains:
//! - a compiled template (`template.json` or `template.yaml`)
//! - optionally a `stackguard.toml`
//!
//! These tests run the CLI against each fixture and verify the exit code (0=pass/warn, 2=fail,
//! 1=tool error) and the parts of the JSON report that carry the verdict.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use stackguard_test_util::normalize_nondeterministic;
use std::path::PathBuf;
use tempfile::TempDir;

const ACTION_STAR: &str =
    "iamRoleStatement granting Action='*'. Wildcard actions in iamRoleStatements are not permitted.";
const ACTION_S3_STAR: &str = "iamRoleStatement granting Action='s3:*'. Wildcard actions in iamRoleStatements are not permitted.";
const RESOURCE_STAR: &str = "iamRoleStatement granting Resource='*'. Wildcard resources in iamRoleStatements are not permitted.";

/// Helper to get a Command for the stackguard binary.
/// Wraps the deprecated cargo_bin to centralize the deprecation warning.
#[allow(deprecated)]
fn stackguard_cmd() -> Command {
    Command::cargo_bin("stackguard").expect("stackguard binary not found - run `cargo build` first")
}

/// Get the path to the test fixtures directory
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("stackguard-cli crate should have a parent directory")
        .parent()
        .expect("crates directory should have a parent (repo root)")
        .join("tests")
        .join("fixtures")
}

fn fixture_template(fixture_name: &str) -> PathBuf {
    let dir = fixtures_dir().join(fixture_name);
    let json = dir.join("template.json");
    if json.exists() {
        json
    } else {
        dir.join("template.yaml")
    }
}

/// Run `stackguard check` against a fixture and return the exit code and JSON report.
fn run_check_on_fixture(fixture_name: &str, extra: &[&str]) -> (i32, Value) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let report_path = temp_dir.path().join("report.json");

    let mut cmd = stackguard_cmd();
    // Run from an empty directory so no stray config is picked up.
    cmd.current_dir(temp_dir.path())
        .arg("check")
        .arg("--template")
        .arg(fixture_template(fixture_name))
        .arg("--report-out")
        .arg(&report_path);

    let config = fixtures_dir().join(fixture_name).join("stackguard.toml");
    if config.exists() {
        cmd.arg("--config").arg(config);
    }
    cmd.args(extra);

    let output = cmd.output().expect("Failed to run command");
    let exit_code = output.status.code().unwrap_or(-1);

    let report_content = std::fs::read_to_string(&report_path).expect("Failed to read report");
    let report: Value = serde_json::from_str(&report_content).expect("Failed to parse report JSON");

    (exit_code, report)
}

fn messages(report: &Value) -> Vec<String> {
    report["findings"]
        .as_array()
        .expect("findings array")
        .iter()
        .map(|f| f["message"].as_str().expect("message").to_string())
        .collect()
}

fn codes(report: &Value) -> Vec<String> {
    report["findings"]
        .as_array()
        .expect("findings array")
        .iter()
        .map(|f| f["code"].as_str().expect("code").to_string())
        .collect()
}

// ============================================================================
// Fixture tests
// ============================================================================

#[test]
fn fixture_specific_role_passes() {
    let (exit_code, report) = run_check_on_fixture("specific_role", &[]);

    assert_eq!(exit_code, 0, "specific_role should exit with 0 (pass)");
    assert_eq!(report["schema"], "stackguard.report.v1");
    assert_eq!(report["verdict"]["status"], "pass");
    assert!(messages(&report).is_empty());

    let wild = report["rules"]
        .as_array()
        .expect("rules")
        .iter()
        .find(|r| r["rule_id"] == "no-wild-iam-role-statements")
        .expect("rule summary");
    assert_eq!(wild["status"], "approved");
    assert_eq!(wild["approvals"], 1);
}

#[test]
fn fixture_wildcard_role_fails_with_every_message() {
    let (exit_code, report) = run_check_on_fixture("wildcard_role", &[]);

    assert_eq!(exit_code, 2, "wildcard_role should exit with 2 (fail)");
    assert_eq!(report["verdict"]["status"], "fail");
    assert_eq!(
        messages(&report),
        vec![ACTION_S3_STAR, ACTION_STAR, RESOURCE_STAR]
    );
    assert_eq!(
        report["findings"][2]["location"]["pointer"],
        "/Resources/IamRoleLambdaExecution/Properties/Policies/0/PolicyDocument/Statement/1/Resource/0"
    );
}

#[test]
fn fixture_join_and_sub_resolve_to_wildcards() {
    let (exit_code, report) = run_check_on_fixture("join_sub_wildcards", &[]);

    assert_eq!(exit_code, 2);
    assert_eq!(messages(&report), vec![RESOURCE_STAR, RESOURCE_STAR]);
    assert_eq!(report["findings"][0]["location"]["resource"], "JoinRole");
    assert_eq!(report["findings"][1]["location"]["resource"], "SubRole");
}

#[test]
fn fixture_yaml_short_form_is_understood() {
    let (exit_code, report) = run_check_on_fixture("yaml_short_form", &[]);

    assert_eq!(exit_code, 2);
    assert_eq!(messages(&report), vec![RESOURCE_STAR]);
}

#[test]
fn fixture_without_roles_passes() {
    let (exit_code, report) = run_check_on_fixture("no_roles", &[]);

    assert_eq!(exit_code, 0);
    assert_eq!(report["verdict"]["status"], "pass");
    assert_eq!(report["data"]["resources_scanned"], 1);
}

#[test]
fn fixture_lambda_rules_use_config_and_meta() {
    let (exit_code, report) = run_check_on_fixture(
        "lambda_rules",
        &["--stage", "scratch", "--service", "orders"],
    );

    assert_eq!(exit_code, 2);
    assert_eq!(
        codes(&report),
        vec![
            "secret_env_var",
            "runtime_not_allowed",
            "stage_not_allowed",
            "missing_dlq"
        ]
    );
    assert_eq!(report["verdict"]["counts"]["error"], 2);
    assert_eq!(report["verdict"]["counts"]["warning"], 2);
    assert_eq!(report["data"]["stage"], "scratch");
    assert_eq!(report["data"]["service"], "orders");
}

#[test]
fn fixture_refs_fail_only_when_closed() {
    let (exit_code, report) = run_check_on_fixture("fail_closed_refs", &[]);
    assert_eq!(exit_code, 2);
    assert_eq!(
        codes(&report),
        vec!["unresolved_action", "unresolved_resource"]
    );

    let temp_dir = TempDir::new().expect("temp dir");
    let report_path = temp_dir.path().join("report.json");
    stackguard_cmd()
        .current_dir(temp_dir.path())
        .arg("check")
        .arg("--template")
        .arg(fixture_template("fail_closed_refs"))
        .arg("--report-out")
        .arg(&report_path)
        .assert()
        .code(0);
}

#[test]
fn warn_profile_exits_zero() {
    let (exit_code, report) = run_check_on_fixture("wildcard_role", &["--profile", "warn"]);

    assert_eq!(exit_code, 0);
    assert_eq!(report["verdict"]["status"], "warn");
    assert_eq!(report["findings"][0]["severity"], "warning");
}

#[test]
fn repeated_runs_produce_identical_reports() {
    let (_, first) = run_check_on_fixture("wildcard_role", &[]);
    let (_, second) = run_check_on_fixture("wildcard_role", &[]);

    // Run timing is the only thing allowed to differ.
    assert_eq!(
        normalize_nondeterministic(first),
        normalize_nondeterministic(second)
    );
}

#[test]
fn stdin_template_is_accepted() {
    let temp_dir = TempDir::new().expect("temp dir");
    let report_path = temp_dir.path().join("report.json");
    let template =
        std::fs::read_to_string(fixture_template("wildcard_role")).expect("read fixture");

    stackguard_cmd()
        .current_dir(temp_dir.path())
        .args(["check", "--template", "-", "--report-out"])
        .arg(&report_path)
        .write_stdin(template)
        .assert()
        .code(2)
        .stderr(predicate::str::contains(ACTION_STAR));
}

#[test]
fn missing_template_is_a_tool_error() {
    let temp_dir = TempDir::new().expect("temp dir");
    let report_path = temp_dir.path().join("out").join("report.json");

    stackguard_cmd()
        .current_dir(temp_dir.path())
        .args(["check", "--template", "does-not-exist.json", "--report-out"])
        .arg(&report_path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("stackguard error"));

    let report: Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).expect("report"))
            .expect("json");
    assert_eq!(report["findings"][0]["code"], "runtime_error");
    assert_eq!(report["findings"][0]["rule_id"], "tool.runtime");
}

#[test]
fn invalid_config_is_a_tool_error() {
    let temp_dir = TempDir::new().expect("temp dir");
    std::fs::write(
        temp_dir.path().join("stackguard.toml"),
        "[rules.no-such-rule]\nenabled = true\n",
    )
    .expect("write config");

    stackguard_cmd()
        .current_dir(temp_dir.path())
        .arg("check")
        .arg("--template")
        .arg(fixture_template("no_roles"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no-such-rule"));
}

#[test]
fn markdown_and_annotations_render_from_report() {
    let temp_dir = TempDir::new().expect("temp dir");
    let report_path = temp_dir.path().join("report.json");
    let md_path = temp_dir.path().join("comment.md");

    stackguard_cmd()
        .current_dir(temp_dir.path())
        .arg("check")
        .arg("--template")
        .arg(fixture_template("wildcard_role"))
        .arg("--report-out")
        .arg(&report_path)
        .arg("--write-markdown")
        .arg("--markdown-out")
        .arg(&md_path)
        .assert()
        .code(2);

    let md = std::fs::read_to_string(&md_path).expect("markdown");
    assert!(md.contains("Verdict: **FAIL**"));
    assert!(md.contains("wildcard_resource"));

    stackguard_cmd()
        .arg("md")
        .arg("--report")
        .arg(&report_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("# Stackguard report"));

    let output = stackguard_cmd()
        .arg("annotations")
        .arg("--report")
        .arg(&report_path)
        .args(["--max", "2"])
        .output()
        .expect("run annotations");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("::error file="));
    assert!(lines[0].contains("title=IamRoleLambdaExecution"));
}

#[test]
fn explain_known_and_unknown_identifiers() {
    stackguard_cmd()
        .args(["explain", "no-wild-iam-role-statements"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Remediation"));

    stackguard_cmd()
        .args(["explain", "no_such_code"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown rule_id or code"));
}

#[test]
fn rules_lists_catalog_with_state() {
    let temp_dir = TempDir::new().expect("temp dir");
    stackguard_cmd()
        .current_dir(temp_dir.path())
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("no-wild-iam-role-statements"))
        .stdout(predicate::str::is_match(r"require-dlq\s+off").expect("regex"));
}
