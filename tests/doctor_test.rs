//! Integration tests for `cubuild doctor`

mod common;

use common::TestProject;
use std::process::Command;

/// Helper to run cubuild doctor
fn run_doctor(args: &[&str]) -> std::process::Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cubuild"));
    cmd.arg("doctor");
    for arg in args {
        cmd.arg(arg);
    }
    cmd.output().expect("Failed to execute cubuild doctor")
}

#[test]
fn test_doctor_reports_compiler_checks() {
    let output = run_doctor(&[]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let combined = format!("{stdout}{stderr}");

    assert!(
        combined.contains("Host C compiler") && combined.contains("nvcc"),
        "doctor should check both compilers: {combined}"
    );
}

#[test]
fn test_doctor_json_output() {
    let output = run_doctor(&["--json"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"checks\""));
    assert!(stdout.contains("\"passed_count\""));
}

#[test]
fn test_doctor_flags_broken_manifest() {
    let project = TestProject::new();
    project.create_file("cubuild.toml", "not [ valid toml");

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cubuild"));
    cmd.current_dir(project.path());
    cmd.arg("doctor");
    let output = cmd.output().expect("Failed to execute cubuild doctor");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let combined = format!("{stdout}{stderr}");
    assert!(
        combined.contains("Invalid manifest") || combined.contains("Configuration issues"),
        "doctor should surface manifest issues: {combined}"
    );
}
