//! Input frames and output records.

use serde::{Deserialize, Serialize};

use super::{FaceLandmarks, FrameResult};

/// A recorded or captured frame for one subject.
#[derive(Debug, Clone)]
pub struct SourceFrame {
    /// Subject or stream identifier.
    pub subject: String,
    /// Capture time in seconds.
    pub timestamp: f64,
    /// Decoded pixels, when available.
    pub image: Option<image::DynamicImage>,
    /// Landmarks supplied alongside the frame, when available.
    pub landmarks: Option<FaceLandmarks>,
}

/// A [`FrameResult`] tagged with its subject and capture time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// Subject or stream identifier.
    pub subject: String,
    /// Capture time in seconds.
    pub timestamp: f64,
    /// Analysis result.
    #[serde(flatten)]
    pub result: FrameResult,
}

impl FrameRecord {
    /// Creates a record.
    #[must_use]
    pub fn new(subject: impl Into<String>, timestamp: f64, result: FrameResult) -> Self {
        Self {
            subject: subject.into(),
            timestamp,
            result,
        }
    }
}
