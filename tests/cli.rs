//! Contract tests for the `conformity` binary: exit codes, output formats
//! and flag handling, exercised through the compiled executable.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Passes every builtin rule.
const QUIET_POD: &str = r#"
apiVersion: v1
kind: Pod
metadata:
  name: quiet
  labels:
    app.kubernetes.io/name: quiet
spec:
  securityContext:
    runAsNonRoot: true
  containers:
    - name: quiet
      image: quiet:1.2.3
      securityContext:
        allowPrivilegeEscalation: false
        readOnlyRootFilesystem: true
      resources:
        requests:
          cpu: 100m
          memory: 64Mi
        limits:
          memory: 64Mi
"#;

/// Trips SEC001 (error) among others.
const RISKY_POD: &str = r#"
apiVersion: v1
kind: Pod
metadata:
  name: risky
spec:
  containers:
    - name: risky
      image: risky:latest
"#;

fn conformity() -> Command {
    let mut cmd = Command::cargo_bin("conformity").unwrap();
    // Keep the ambient environment out of the contract.
    cmd.env_remove("CONFORMITY_CONFIG");
    cmd
}

fn write_manifest(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_clean_manifest_exits_zero() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, "quiet.yaml", QUIET_POD);

    conformity()
        .arg("check")
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("No conformance issues found."));
}

#[test]
fn test_findings_exit_one() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, "risky.yaml", RISKY_POD);

    conformity()
        .arg("check")
        .arg(&manifest)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("SEC001"))
        .stdout(predicate::str::contains("risky.yaml"));
}

#[test]
fn test_nothing_parsed_exits_two() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, "broken.yaml", "\t: not yaml\n");

    conformity()
        .arg("check")
        .arg(&manifest)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Parse failures"));
}

#[test]
fn test_unknown_rule_exits_three() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, "quiet.yaml", QUIET_POD);

    conformity()
        .arg("check")
        .arg("--rules")
        .arg("NOPE01")
        .arg(&manifest)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("unknown rule id 'NOPE01'"));
}

#[test]
fn test_unknown_category_exits_three() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, "quiet.yaml", QUIET_POD);

    conformity()
        .arg("check")
        .arg("--categories")
        .arg("plumbing")
        .arg(&manifest)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("unknown category 'plumbing'"));
}

#[test]
fn test_json_format_is_machine_readable() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, "risky.yaml", RISKY_POD);

    let output = conformity()
        .arg("check")
        .arg("--format")
        .arg("json")
        .arg(&manifest)
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["complete"], true);
    assert_eq!(value["summary"]["documents"], 1);

    let findings = value["findings"].as_array().unwrap();
    assert!(!findings.is_empty());
    for finding in findings {
        assert!(finding["ruleId"].is_string());
        assert!(finding["severity"].is_string());
        assert!(finding["message"].is_string());
        assert_eq!(finding["document"]["kind"], "Pod");
    }
}

#[test]
fn test_fail_on_warning_raises_the_bar() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, "latest.yaml", RISKY_POD);

    // AVL004 alone is a warning; below the default error threshold.
    conformity()
        .arg("check")
        .arg("--rules")
        .arg("AVL004")
        .arg(&manifest)
        .assert()
        .success();

    conformity()
        .arg("check")
        .arg("--rules")
        .arg("AVL004")
        .arg("--fail-on")
        .arg("warning")
        .arg(&manifest)
        .assert()
        .code(1);
}

#[test]
fn test_stdin_is_the_default_input() {
    conformity()
        .arg("check")
        .write_stdin(RISKY_POD)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("<stdin>"));

    // An explicit `-` reads stdin too.
    conformity()
        .arg("check")
        .arg("-")
        .write_stdin(QUIET_POD)
        .assert()
        .success();
}

#[test]
fn test_output_flag_writes_the_report() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, "risky.yaml", RISKY_POD);
    let report_path = dir.path().join("report.json");

    conformity()
        .arg("check")
        .arg("--format")
        .arg("json")
        .arg("--output")
        .arg(&report_path)
        .arg(&manifest)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Report saved to:"));

    let saved = fs::read_to_string(&report_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert!(value["findings"].as_array().is_some_and(|f| !f.is_empty()));
}

#[test]
fn test_config_file_sets_the_threshold() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, "latest.yaml", RISKY_POD);
    let config = dir.path().join("conformity.yaml");
    fs::write(&config, "enabledRuleIds: [AVL004]\nfailOn: warning\n").unwrap();

    conformity()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .arg(&manifest)
        .assert()
        .code(1);

    // CLI flags win over the file.
    conformity()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .arg("--fail-on")
        .arg("error")
        .arg(&manifest)
        .assert()
        .success();
}

#[test]
fn test_malformed_config_exits_three() {
    let dir = TempDir::new().unwrap();
    let manifest = write_manifest(&dir, "quiet.yaml", QUIET_POD);
    let config = dir.path().join("conformity.yaml");
    fs::write(&config, "failOn: catastrophic\n").unwrap();

    conformity()
        .arg("check")
        .arg("--config")
        .arg(&config)
        .arg(&manifest)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_directory_input_checks_every_manifest() {
    let dir = TempDir::new().unwrap();
    write_manifest(&dir, "a.yaml", QUIET_POD);
    write_manifest(&dir, "b.yaml", RISKY_POD);
    write_manifest(&dir, "notes.txt", "not a manifest");

    let output = conformity()
        .arg("check")
        .arg("--format")
        .arg("json")
        .arg(dir.path())
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(value["summary"]["documents"], 2);
}

#[test]
fn test_rules_subcommand_lists_the_catalog() {
    conformity()
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("SEC001"))
        .stdout(predicate::str::contains("AVL002"))
        .stdout(predicate::str::contains("cross-document"));
}

#[test]
fn test_rules_subcommand_filters_by_category() {
    conformity()
        .arg("rules")
        .arg("--category")
        .arg("security")
        .assert()
        .success()
        .stdout(predicate::str::contains("SEC001"))
        .stdout(predicate::str::contains("RES001").not());
}
