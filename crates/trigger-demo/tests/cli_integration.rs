//! Integration tests for the trigger-demo CLI.

use std::fs;
use std::path::PathBuf;
use std::process::Command;

use tracing as _;
use tracing_subscriber as _;
use trigger_core as _;
use trigger_demo as _;

fn binary_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.join("trigger-demo")
}

#[test]
fn run_writes_records_only_inside_window() {
    let temp_dir = tempfile::tempdir().unwrap();
    let output = temp_dir.path().join("trace.log");

    let status = Command::new(binary_path())
        .args([
            "run",
            "--start",
            "5",
            "--end",
            "9",
            "--cycles",
            "20",
            "-o",
            output.to_str().unwrap(),
        ])
        .status()
        .expect("failed to run trigger-demo");

    assert!(status.success());

    let text = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 10);
    assert!(lines[0].starts_with("[       5] top: lfsr = 0x"));
    assert!(lines[1].starts_with("[       5] top.child: parity = "));
    assert!(lines[9].starts_with("[       9] top.child:"));
}

#[test]
fn default_run_prints_901_parent_records() {
    let output = Command::new(binary_path())
        .arg("run")
        .output()
        .expect("failed to run trigger-demo");

    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let parent_lines = stdout
        .lines()
        .filter(|line| line.contains("] top: "))
        .count();
    assert_eq!(parent_lines, 901);

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("emitted 1802 records"));
}

#[test]
fn pulse_run_emits_on_window_entry() {
    let temp_dir = tempfile::tempdir().unwrap();
    let output = temp_dir.path().join("pulse.log");

    let status = Command::new(binary_path())
        .args(["run", "--pulse", "-o", output.to_str().unwrap()])
        .status()
        .expect("failed to run trigger-demo");

    assert!(status.success());
    let text = fs::read_to_string(&output).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(text.starts_with("[     100] top:"));
}

#[test]
fn unwired_run_without_fallback_is_silent() {
    let output = Command::new(binary_path())
        .args(["run", "--unwired", "--cycles", "50"])
        .output()
        .expect("failed to run trigger-demo");

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn help_flag_succeeds() {
    let output = Command::new(binary_path())
        .arg("--help")
        .output()
        .expect("failed to run trigger-demo");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Usage: trigger-demo"));
}

#[test]
fn unknown_policy_fails() {
    let output = Command::new(binary_path())
        .args(["run", "--policy", "xor"])
        .output()
        .expect("failed to run trigger-demo");

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("unknown combine policy"));
}

#[test]
fn unwritable_output_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    let output = temp_dir.path().join("missing").join("trace.log");

    let status = Command::new(binary_path())
        .args(["run", "-o", output.to_str().unwrap()])
        .status()
        .expect("failed to run trigger-demo");

    assert!(!status.success());
}
