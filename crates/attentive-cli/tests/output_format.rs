//! Output format validation tests.
//!
//! Tests JSON/JSONL output format correctness and required field presence.

#![allow(clippy::unwrap_used)]
#![allow(deprecated)] // cargo_bin deprecation

mod common;

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use attentive_test_support::SyntheticFaceBuilder;
use predicates::prelude::*;
use serde_json::Value;

fn attentive(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("attentive").unwrap();
    cmd.env("XDG_CONFIG_HOME", dir)
        .current_dir(dir)
        .arg("--no-model")
        .arg("--quiet");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    String::from_utf8(output.stdout).unwrap()
}

// === JSONL Format Tests ===

#[test]
fn test_jsonl_one_object_per_frame() {
    let temp_dir = tempfile::tempdir().unwrap();
    let recording = common::focused_recording(temp_dir.path(), "alice");

    let stdout = stdout_of(attentive(temp_dir.path()).arg(&recording));
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    for line in lines {
        let value: Value = serde_json::from_str(line).unwrap();
        assert!(value.is_object(), "JSONL line should be an object");
    }
}

#[test]
fn test_jsonl_required_fields() {
    let temp_dir = tempfile::tempdir().unwrap();
    let recording = common::focused_recording(temp_dir.path(), "alice");

    let stdout = stdout_of(attentive(temp_dir.path()).arg(&recording));
    let first: Value = serde_json::from_str(stdout.lines().next().unwrap()).unwrap();

    for field in [
        "subject",
        "timestamp",
        "emotion",
        "engagement",
        "focus_level",
        "face_detected",
        "is_focused_gaze",
        "gaze_direction",
        "eye_openness",
        "wearing_glasses",
        "face_distance",
        "lighting_quality",
    ] {
        assert!(first.get(field).is_some(), "missing field {field}");
    }
    assert_eq!(first["subject"], "alice");
    assert_eq!(first["emotion"], "neutral");
    assert_eq!(first["focus_level"], 60);
    assert_eq!(first["face_detected"], true);
    assert_eq!(first["is_focused_gaze"], true);
    assert_eq!(first["gaze_direction"], "CENTER");
    assert_eq!(first["error"], "model not loaded");
}

#[test]
fn test_jsonl_preserves_frame_order() {
    let temp_dir = tempfile::tempdir().unwrap();
    let face = SyntheticFaceBuilder::new();
    let recording = common::write_recording(
        temp_dir.path(),
        "order.jsonl",
        &[
            common::frame_line("alice", 0.0, Some(&face)),
            common::frame_line("bob", 0.1, None),
            common::frame_line("alice", 0.2, Some(&face.clone().gaze(0.0, 0.5))),
        ],
    );

    let stdout = stdout_of(attentive(temp_dir.path()).arg(&recording));
    let records: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let subjects: Vec<_> = records.iter().map(|r| r["subject"].clone()).collect();
    assert_eq!(subjects, ["alice", "bob", "alice"]);
    assert_eq!(records[1]["face_detected"], false);
    assert_eq!(records[2]["gaze_direction"], "DOWN");
}

// === JSON Array Format Tests ===

#[test]
fn test_json_format_is_array() {
    let temp_dir = tempfile::tempdir().unwrap();
    let recording = common::focused_recording(temp_dir.path(), "alice");

    let stdout = stdout_of(
        attentive(temp_dir.path())
            .args(["--format", "json"])
            .arg(&recording),
    );
    let value: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 3);
}

#[test]
fn test_json_pretty_is_multiline() {
    let temp_dir = tempfile::tempdir().unwrap();
    let recording = common::focused_recording(temp_dir.path(), "alice");

    attentive(temp_dir.path())
        .args(["--format", "json", "--pretty"])
        .arg(&recording)
        .assert()
        .code(0)
        .stdout(predicate::str::starts_with("[\n"));
}

// === Summary Tests ===

#[test]
fn test_summary_file_per_subject() {
    let temp_dir = tempfile::tempdir().unwrap();
    let alice = common::focused_recording(temp_dir.path(), "alice");
    let bob = common::focused_recording(temp_dir.path(), "bob");
    let summary = temp_dir.path().join("summary.json");

    attentive(temp_dir.path())
        .arg("--summary")
        .arg(&summary)
        .arg(&bob)
        .arg(&alice)
        .assert()
        .code(0);

    let report: Value = serde_json::from_str(&fs::read_to_string(&summary).unwrap()).unwrap();
    assert!(report["generated_at"].as_str().unwrap().contains('T'));
    let sessions = report["sessions"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0]["subject"], "alice");
    assert_eq!(sessions[1]["subject"], "bob");
    assert_eq!(sessions[0]["frames"], 3);
    assert_eq!(sessions[0]["focused_frames"], 3);
    assert_eq!(sessions[0]["alerts"], 0);
}

#[test]
fn test_summary_records_alerts() {
    let temp_dir = tempfile::tempdir().unwrap();
    let away = SyntheticFaceBuilder::new().gaze(0.0, 0.5);
    let lines: Vec<_> = (0..6)
        .map(|t| common::frame_line("carol", f64::from(t), Some(&away)))
        .collect();
    let recording = common::write_recording(temp_dir.path(), "carol.jsonl", &lines);
    let summary = temp_dir.path().join("summary.json");

    attentive(temp_dir.path())
        .args(["--alert-after", "2"])
        .arg("--summary")
        .arg(&summary)
        .arg(&recording)
        .assert()
        .code(0);

    let report: Value = serde_json::from_str(&fs::read_to_string(&summary).unwrap()).unwrap();
    let session = &report["sessions"][0];
    assert_eq!(session["focused_frames"], 0);
    assert!(session["alerts"].as_u64().unwrap() >= 1);
}
