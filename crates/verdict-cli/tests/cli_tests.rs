//! CLI integration tests
//!
//! Every run passes `--no-color` and points artifacts at a temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn verdict_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("verdict").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("VERDICT_FILTER")
        .env_remove("VERDICT_REPORT_DIR")
        .env_remove("VERDICT_REPORT_PREFIX")
        .env_remove("VERDICT_NO_SAVE")
        .env("HOME", dir.path())
        .arg("--no-color");
    cmd
}

fn artifacts(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".txt"))
        .collect();
    names.sort();
    names
}

// ══════════════════════════════════════════════════════════════════════════════
// HELP AND COMPLETIONS
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_help_lists_commands_and_env() {
    let dir = TempDir::new().unwrap();
    verdict_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("completions"))
        .stdout(predicate::str::contains("VERDICT_REPORT_DIR"));
}

#[test]
fn test_completions_bash() {
    let dir = TempDir::new().unwrap();
    verdict_cmd(&dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("verdict"));
}

// ══════════════════════════════════════════════════════════════════════════════
// RUN
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_run_samples_passes_and_saves() {
    let dir = TempDir::new().unwrap();
    verdict_cmd(&dir)
        .args(["run", "samples"])
        .assert()
        .success()
        .stdout(predicate::str::contains("=== TEST RUN SUMMARY ==="))
        .stdout(predicate::str::contains("Failed: 0"))
        .stdout(predicate::str::contains("Category: Integration"))
        .stdout(predicate::str::contains("Results saved to"));

    let saved = artifacts(&dir);
    assert_eq!(saved.len(), 1);
    assert!(saved[0].starts_with("test_results_"));
}

#[test]
fn test_run_failures_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    verdict_cmd(&dir)
        .args(["run", "failures", "--no-save"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[FAIL] FailureKinds.assertion"))
        .stdout(predicate::str::contains(
            "      Assert.AreEqual failed: expected 4, actual 5. arithmetic",
        ))
        .stdout(predicate::str::contains("Suite setup failed"));
    assert!(artifacts(&dir).is_empty());
}

#[test]
fn test_run_unknown_module() {
    let dir = TempDir::new().unwrap();
    verdict_cmd(&dir)
        .args(["run", "openings"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown module 'openings'"));
}

#[test]
fn test_run_json_with_filter() {
    let dir = TempDir::new().unwrap();
    let output = verdict_cmd(&dir)
        .args(["run", "samples", "--json", "--no-save", "--filter", "KnightMoves"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["tests"], 6);
    assert_eq!(value["failed"], 0);
    assert_eq!(value["results"][0]["category"], "Knight");
}

#[test]
fn test_project_config_sets_prefix_and_dir() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("verdict.toml"),
        "[report]\nprefix = \"chess_test_results\"\noutput_dir = \"reports\"\n",
    )
    .unwrap();

    verdict_cmd(&dir).args(["run", "samples"]).assert().success();

    let reports: Vec<_> = fs::read_dir(dir.path().join("reports")).unwrap().collect();
    assert_eq!(reports.len(), 1);
    let name = reports[0].as_ref().unwrap().file_name();
    assert!(name.to_string_lossy().starts_with("chess_test_results_"));
}

#[test]
fn test_env_no_save() {
    let dir = TempDir::new().unwrap();
    verdict_cmd(&dir)
        .env("VERDICT_NO_SAVE", "1")
        .args(["run", "samples"])
        .assert()
        .success();
    assert!(artifacts(&dir).is_empty());
}

// ══════════════════════════════════════════════════════════════════════════════
// LIST AND INTERACTIVE
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_list_samples() {
    let dir = TempDir::new().unwrap();
    verdict_cmd(&dir)
        .args(["list", "samples"])
        .assert()
        .success()
        .stdout(predicate::str::contains("KnightMoves"))
        .stdout(predicate::str::contains("destination_count"));
}

#[test]
fn test_interactive_reads_stdin_until_empty_line() {
    let dir = TempDir::new().unwrap();
    verdict_cmd(&dir)
        .arg("--no-save")
        .write_stdin("samples\n\nfailures\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Module to run"))
        .stdout(predicate::str::contains("Category: Knight"))
        .stdout(predicate::str::contains("FailureKinds").not());
}

#[test]
fn test_interactive_eof_is_clean_exit() {
    let dir = TempDir::new().unwrap();
    verdict_cmd(&dir).write_stdin("").assert().success();
}
