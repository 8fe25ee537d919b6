//! Per-frame analysis result types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error text reported while no emotion classifier is loaded.
pub const MODEL_NOT_LOADED: &str = "model not loaded";

/// Learner engagement category derived from the smoothed emotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Engagement {
    /// Positive or attentive state.
    Active,
    /// Calm or withdrawn, not distracted.
    Passive,
    /// Negative or disengaged.
    Distracted,
}

impl Engagement {
    /// Returns the lower-case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Passive => "passive",
            Self::Distracted => "distracted",
        }
    }
}

impl fmt::Display for Engagement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Eight-way gaze direction, vertical taking priority over horizontal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GazeDirection {
    /// Within both thresholds.
    #[serde(rename = "CENTER")]
    Center,
    /// Horizontal deviation toward negative x.
    #[serde(rename = "LEFT")]
    Left,
    /// Horizontal deviation toward positive x.
    #[serde(rename = "RIGHT")]
    Right,
    /// Vertical deviation toward negative y.
    #[serde(rename = "UP")]
    Up,
    /// Vertical deviation toward positive y.
    #[serde(rename = "DOWN")]
    Down,
    /// Up and left.
    #[serde(rename = "UP-LEFT")]
    UpLeft,
    /// Up and right.
    #[serde(rename = "UP-RIGHT")]
    UpRight,
    /// Down and left.
    #[serde(rename = "DOWN-LEFT")]
    DownLeft,
    /// Down and right.
    #[serde(rename = "DOWN-RIGHT")]
    DownRight,
}

impl GazeDirection {
    /// Returns the upper-case label used in serialized output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Center => "CENTER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::UpLeft => "UP-LEFT",
            Self::UpRight => "UP-RIGHT",
            Self::DownLeft => "DOWN-LEFT",
            Self::DownRight => "DOWN-RIGHT",
        }
    }
}

impl fmt::Display for GazeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Head orientation in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HeadPose {
    /// Rotation about the vertical axis.
    pub yaw: f64,
    /// Rotation about the horizontal axis.
    pub pitch: f64,
    /// Rotation about the viewing axis.
    pub roll: f64,
}

/// Analysis result for one frame of one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameResult {
    /// Smoothed emotion label.
    pub emotion: Option<String>,
    /// Classifier output for this frame before smoothing.
    pub raw_emotion: Option<String>,
    /// Highest class probability, 0 when unavailable.
    pub confidence: f32,
    /// Engagement category.
    pub engagement: Engagement,
    /// Attentiveness estimate, 0-100.
    pub focus_level: u8,
    /// Whether a usable face was found.
    pub face_detected: bool,
    /// Whether gaze and head position indicate attention on the screen.
    pub is_focused_gaze: bool,
    /// Gaze direction, when gaze analysis ran.
    pub gaze_direction: Option<GazeDirection>,
    /// Average eye aspect ratio.
    pub eye_openness: f64,
    /// Eyewear heuristic.
    pub wearing_glasses: bool,
    /// Smoothed distance ratio (1.0 = optimal, larger = farther).
    pub face_distance: f64,
    /// Smoothed lighting quality, 0.3-1.0.
    pub lighting_quality: f64,
    /// Head pose.
    pub pose: HeadPose,
    /// Error description for degraded frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FrameResult {
    /// Result for a frame with no usable face.
    #[must_use]
    pub fn no_face() -> Self {
        Self {
            emotion: None,
            raw_emotion: None,
            confidence: 0.0,
            engagement: Engagement::Distracted,
            focus_level: 0,
            face_detected: false,
            is_focused_gaze: false,
            gaze_direction: None,
            eye_openness: 0.0,
            wearing_glasses: false,
            face_distance: 1.0,
            lighting_quality: 1.0,
            pose: HeadPose::default(),
            error: None,
        }
    }

    /// Result for a frame whose processing failed.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::no_face()
        }
    }

    /// Neutral result emitted while no classifier is loaded.
    #[must_use]
    pub fn no_model() -> Self {
        Self {
            emotion: Some("neutral".to_string()),
            engagement: Engagement::Passive,
            focus_level: 60,
            error: Some(MODEL_NOT_LOADED.to_string()),
            ..Self::no_face()
        }
    }

    /// Returns true if the frame failed for a reason other than a missing model.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.error
            .as_deref()
            .is_some_and(|error| error != MODEL_NOT_LOADED)
    }
}
