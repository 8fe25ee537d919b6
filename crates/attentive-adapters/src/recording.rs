//! JSONL landmark recordings.
//!
//! Each non-blank line is one captured frame:
//!
//! ```json
//! {"subject": "alice", "timestamp": 12.5, "width": 640, "height": 480,
//!  "image": "frames/0001.png", "landmarks": [[0.41, 0.38, -0.02], ...],
//!  "confidence": 0.93}
//! ```
//!
//! `landmarks` may be `null` (no face). Coordinates are normalized unless
//! `"coordinates": "pixels"` is given. Frames may carry an `image` path
//! (relative to the recording) or an inline `image_base64`; either only feeds
//! lighting assessment. `subject` defaults to the recording's file stem.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use attentive_core::pipeline::decode_base64_image;
use attentive_core::{FaceLandmarks, FrameSource, Landmark, SourceFrame};
use image::DynamicImage;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::fs::load_frame;

/// Coordinate space of recorded landmarks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Coordinates {
    /// `x`, `y` in 0..1 of the frame, `z` relative to frame width.
    #[default]
    Normalized,
    /// Pixel coordinates.
    Pixels,
}

#[derive(Debug, Deserialize)]
struct FrameLine {
    #[serde(default)]
    subject: Option<String>,
    timestamp: f64,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    image: Option<PathBuf>,
    #[serde(default)]
    image_base64: Option<String>,
    #[serde(default)]
    landmarks: Option<Vec<[f64; 3]>>,
    #[serde(default)]
    coordinates: Coordinates,
    #[serde(default)]
    confidence: Option<f32>,
}

/// Frame source replaying one or more JSONL recordings in order.
pub struct RecordingSource {
    paths: Vec<PathBuf>,
}

impl RecordingSource {
    /// Creates a source over the given recording files.
    #[must_use]
    pub const fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Recording files, in replay order.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl FrameSource for RecordingSource {
    fn frames(&self) -> Box<dyn Iterator<Item = Result<SourceFrame>> + Send + '_> {
        Box::new(self.paths.iter().flat_map(|path| read_recording(path)))
    }

    fn count_hint(&self) -> Option<usize> {
        let mut total = 0;
        for path in &self.paths {
            let file = File::open(path).ok()?;
            total += BufReader::new(file)
                .lines()
                .map_while(std::result::Result::ok)
                .filter(|line| !line.trim().is_empty())
                .count();
        }
        Some(total)
    }
}

/// Lazily parses one recording. Open failures surface as a single error item.
fn read_recording(path: &Path) -> Box<dyn Iterator<Item = Result<SourceFrame>> + Send> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            warn!("Failed to open recording {}: {e}", path.display());
            let err = anyhow!(e).context(format!("Failed to open recording: {}", path.display()));
            return Box::new(std::iter::once(Err(err)));
        }
    };
    debug!("Replaying recording {}", path.display());

    let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let default_subject = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("default")
        .to_string();
    let display = path.display().to_string();

    Box::new(
        BufReader::new(file)
            .lines()
            .enumerate()
            .filter_map(move |(index, line)| {
                let line_no = index + 1;
                let parsed = line
                    .context("Failed to read line")
                    .and_then(|line| {
                        if line.trim().is_empty() {
                            Ok(None)
                        } else {
                            parse_line(&line, &base, &default_subject).map(Some)
                        }
                    })
                    .with_context(|| format!("{display}:{line_no}"));
                parsed.transpose()
            }),
    )
}

/// Parses one recorded frame.
///
/// # Errors
///
/// Returns an error if the line is not a valid frame record, its image cannot
/// be loaded, or landmarks are present without a known frame size.
pub fn parse_line(line: &str, base: &Path, default_subject: &str) -> Result<SourceFrame> {
    let record: FrameLine = serde_json::from_str(line).context("Invalid frame record")?;

    let image = match (&record.image, &record.image_base64) {
        (Some(_), Some(_)) => bail!("Frame has both image and image_base64"),
        (Some(path), None) => Some(load_frame(&base.join(path))?),
        (None, Some(data)) => Some(decode_base64_image(data)?),
        (None, None) => None,
    };

    let landmarks = match &record.landmarks {
        Some(points) => {
            let (width, height) = frame_size(&record, image.as_ref())
                .context("Landmarks need width and height or an image")?;
            let face = match record.coordinates {
                Coordinates::Normalized => FaceLandmarks::from_normalized(points, width, height),
                Coordinates::Pixels => FaceLandmarks::new(
                    points
                        .iter()
                        .map(|&[x, y, z]| Landmark::new(x, y, z))
                        .collect(),
                    width,
                    height,
                ),
            };
            Some(match record.confidence {
                Some(confidence) => face.with_confidence(confidence),
                None => face,
            })
        }
        None => None,
    };

    Ok(SourceFrame {
        subject: record
            .subject
            .unwrap_or_else(|| default_subject.to_string()),
        timestamp: record.timestamp,
        image,
        landmarks,
    })
}

/// Explicit size wins over the image's.
fn frame_size(record: &FrameLine, image: Option<&DynamicImage>) -> Option<(u32, u32)> {
    match (record.width, record.height) {
        (Some(width), Some(height)) => Some((width, height)),
        _ => image.map(|image| (image.width(), image.height())),
    }
}
