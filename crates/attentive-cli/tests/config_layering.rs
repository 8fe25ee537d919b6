//! Integration tests for configuration layering.
//!
//! Tests the full priority chain: hardcoded defaults < XDG config < project config < CLI args

#![allow(clippy::unwrap_used)] // Test code uses unwrap for brevity
#![allow(deprecated)] // cargo_bin deprecation warning

mod common;

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use attentive_test_support::SyntheticFaceBuilder;
use predicates::prelude::*;
use serde_json::Value;

fn attentive(dir: &Path, config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("attentive").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home)
        .current_dir(dir)
        .arg("--no-model")
        .arg("--quiet");
    cmd
}

fn write_project_config(dir: &Path, contents: &str) {
    fs::write(dir.join(".attentive.toml"), contents).unwrap();
}

fn write_xdg_config(config_home: &Path, contents: &str) {
    let dir = config_home.join("attentive");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.toml"), contents).unwrap();
}

/// One face reported at 0.7 detector confidence.
fn uncertain_recording(dir: &Path) -> std::path::PathBuf {
    let face = SyntheticFaceBuilder::new().confidence(0.7);
    common::write_recording(
        dir,
        "uncertain.jsonl",
        &[common::frame_line("alice", 0.0, Some(&face))],
    )
}

fn face_detected(cmd: &mut Command) -> bool {
    let output = cmd.output().unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    let record: Value = serde_json::from_str(stdout.lines().next().unwrap()).unwrap();
    record["face_detected"].as_bool().unwrap()
}

#[test]
fn test_project_config_applies_format() {
    let temp_dir = tempfile::tempdir().unwrap();
    let recording = common::focused_recording(temp_dir.path(), "alice");
    write_project_config(temp_dir.path(), "[output]\nformat = 'json'\n");

    attentive(temp_dir.path(), temp_dir.path())
        .arg(&recording)
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with("["));
}

#[test]
fn test_cli_overrides_project_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let recording = common::focused_recording(temp_dir.path(), "alice");
    write_project_config(temp_dir.path(), "[output]\nformat = 'json'\n");

    attentive(temp_dir.path(), temp_dir.path())
        .args(["--format", "jsonl"])
        .arg(&recording)
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with("{"));
}

#[test]
fn test_project_config_found_in_parent() {
    let temp_dir = tempfile::tempdir().unwrap();
    let nested = temp_dir.path().join("a/b");
    fs::create_dir_all(&nested).unwrap();
    let recording = common::focused_recording(temp_dir.path(), "alice");
    write_project_config(temp_dir.path(), "[output]\nformat = 'json'\n");

    attentive(&nested, temp_dir.path())
        .arg(&recording)
        .assert()
        .stdout(predicate::str::starts_with("["));
}

#[test]
fn test_detection_threshold_layers() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_home = tempfile::tempdir().unwrap();
    let recording = uncertain_recording(temp_dir.path());

    // Default 0.5 accepts the face
    assert!(face_detected(
        attentive(temp_dir.path(), config_home.path()).arg(&recording)
    ));

    // XDG raises the bar
    write_xdg_config(
        config_home.path(),
        "[detector]\nmin_detection_confidence = 0.9\n",
    );
    assert!(!face_detected(
        attentive(temp_dir.path(), config_home.path()).arg(&recording)
    ));

    // Project lowers it again
    write_project_config(
        temp_dir.path(),
        "[detector]\nmin_detection_confidence = 0.6\n",
    );
    assert!(face_detected(
        attentive(temp_dir.path(), config_home.path()).arg(&recording)
    ));

    // CLI wins over both
    assert!(!face_detected(
        attentive(temp_dir.path(), config_home.path())
            .args(["--min-detection-confidence", "0.8"])
            .arg(&recording)
    ));
}

#[test]
fn test_invalid_config_value_warns_and_falls_back() {
    let temp_dir = tempfile::tempdir().unwrap();
    let recording = uncertain_recording(temp_dir.path());
    write_project_config(
        temp_dir.path(),
        "[detector]\nmin_detection_confidence = 3.0\n",
    );

    let mut cmd = attentive(temp_dir.path(), temp_dir.path());
    cmd.arg(&recording)
        .assert()
        .code(0)
        .stderr(predicate::str::contains("warning: detector.min_detection_confidence"));
    assert!(face_detected(&mut cmd));
}

#[test]
fn test_malformed_config_is_ignored() {
    let temp_dir = tempfile::tempdir().unwrap();
    let recording = common::focused_recording(temp_dir.path(), "alice");
    write_project_config(temp_dir.path(), "[output\nformat = ");

    attentive(temp_dir.path(), temp_dir.path())
        .arg(&recording)
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with("{"));
}
