//! Shared helpers for CLI integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use attentive_core::FaceLandmarks;
use attentive_test_support::SyntheticFaceBuilder;
use serde_json::json;

/// One recorded frame with pixel landmarks, or no face when `face` is `None`.
pub fn frame_line(subject: &str, timestamp: f64, face: Option<&SyntheticFaceBuilder>) -> String {
    let face = face.map(SyntheticFaceBuilder::build);
    let landmarks = face.as_ref().map(|face| {
        face.points()
            .iter()
            .map(|p| [p.x, p.y, p.z])
            .collect::<Vec<_>>()
    });
    json!({
        "subject": subject,
        "timestamp": timestamp,
        "width": 640,
        "height": 480,
        "coordinates": "pixels",
        "landmarks": landmarks,
        "confidence": face.as_ref().and_then(FaceLandmarks::confidence),
    })
    .to_string()
}

/// Writes `lines` as a recording named `name` in `dir`.
pub fn write_recording(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, lines.join("\n")).unwrap();
    path
}

/// Three centred frames for `subject`, one second apart.
pub fn focused_recording(dir: &Path, subject: &str) -> PathBuf {
    let face = SyntheticFaceBuilder::new();
    let lines: Vec<_> = (0..3)
        .map(|t| frame_line(subject, f64::from(t), Some(&face)))
        .collect();
    write_recording(dir, &format!("{subject}.jsonl"), &lines)
}
