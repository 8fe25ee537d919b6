//! Adaptive gaze thresholds.
//!
//! The three decision boundaries (horizontal focus, vertical gaze, eye
//! closure) widen or tighten each frame from the subject's distance, eyewear
//! and lighting, then clamp to fixed ranges.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Constants for threshold adaptation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdProfile {
    /// Horizontal gaze threshold before adjustment.
    pub base_focus: f64,
    /// Vertical gaze threshold before adjustment.
    pub base_vertical: f64,
    /// Eye aspect ratio threshold before adjustment.
    pub base_ear: f64,
    /// Distance factor slope when closer than optimal.
    pub close_gain: f64,
    /// Distance factor slope when farther than optimal.
    pub far_gain: f64,
    /// Multiplier on the focus threshold when glasses are detected.
    pub glasses_focus: f64,
    /// Multiplier on the EAR threshold when glasses are detected.
    pub glasses_ear: f64,
    /// Lighting factor slope on the EAR threshold.
    pub lighting_gain: f64,
    /// Clamp range for the focus threshold.
    pub focus_range: (f64, f64),
    /// Clamp range for the vertical threshold.
    pub vertical_range: (f64, f64),
    /// Clamp range for the EAR threshold.
    pub ear_range: (f64, f64),
}

impl ThresholdProfile {
    /// Webcam-calibrated constants used by the streaming pipeline.
    #[must_use]
    pub const fn streaming() -> Self {
        Self {
            base_focus: 0.20,
            base_vertical: 0.25,
            base_ear: 0.20,
            close_gain: 0.2,
            far_gain: 0.15,
            glasses_focus: 1.1,
            glasses_ear: 0.9,
            lighting_gain: 0.1,
            focus_range: (0.18, 0.35),
            vertical_range: (0.22, 0.40),
            ear_range: (0.15, 0.28),
        }
    }

    /// More lenient constants of the standalone desktop monitor.
    #[must_use]
    pub const fn desktop() -> Self {
        Self {
            base_focus: 0.35,
            base_vertical: 0.40,
            base_ear: 0.20,
            close_gain: 0.5,
            far_gain: 0.3,
            glasses_focus: 1.15,
            glasses_ear: 0.9,
            lighting_gain: 0.2,
            focus_range: (0.30, 0.65),
            vertical_range: (0.35, 0.70),
            ear_range: (0.15, 0.28),
        }
    }

    /// Checks that every constant is finite, bases and multipliers are
    /// positive, gains are non-negative and each clamp range is ordered.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid constant.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("base_focus", self.base_focus),
            ("base_vertical", self.base_vertical),
            ("base_ear", self.base_ear),
            ("glasses_focus", self.glasses_focus),
            ("glasses_ear", self.glasses_ear),
        ] {
            ensure!(
                value.is_finite() && value > 0.0,
                "{name} must be positive, got {value}"
            );
        }
        for (name, value) in [
            ("close_gain", self.close_gain),
            ("far_gain", self.far_gain),
            ("lighting_gain", self.lighting_gain),
        ] {
            ensure!(
                value.is_finite() && value >= 0.0,
                "{name} must be non-negative, got {value}"
            );
        }
        for (name, (lo, hi)) in [
            ("focus_range", self.focus_range),
            ("vertical_range", self.vertical_range),
            ("ear_range", self.ear_range),
        ] {
            ensure!(
                lo.is_finite() && hi.is_finite() && lo <= hi,
                "{name} must be an ordered finite range, got ({lo}, {hi})"
            );
        }
        Ok(())
    }

    /// Distance factor: widens faster when close than when far.
    #[must_use]
    pub fn distance_factor(&self, distance: f64) -> f64 {
        if distance < 1.0 {
            1.0 + (1.0 - distance) * self.close_gain
        } else {
            1.0 + (distance - 1.0) * self.far_gain
        }
    }

    /// Computes clamped thresholds for the current conditions.
    ///
    /// `distance` is the smoothed distance ratio (1.0 optimal), `lighting` the
    /// smoothed lighting quality (1.0 best).
    #[must_use]
    pub fn adapt(&self, distance: f64, wearing_glasses: bool, lighting: f64) -> AdaptiveThresholds {
        let distance_factor = self.distance_factor(distance);
        let (glasses_focus, glasses_ear) = if wearing_glasses {
            (self.glasses_focus, self.glasses_ear)
        } else {
            (1.0, 1.0)
        };
        let lighting_factor = 1.0 + (1.0 - lighting) * self.lighting_gain;

        AdaptiveThresholds {
            focus: clamp_range(self.base_focus * distance_factor * glasses_focus, self.focus_range),
            vertical: clamp_range(self.base_vertical * distance_factor, self.vertical_range),
            ear: clamp_range(self.base_ear * lighting_factor * glasses_ear, self.ear_range),
        }
    }
}

impl Default for ThresholdProfile {
    fn default() -> Self {
        Self::streaming()
    }
}

/// NaN inputs clamp to the lower bound. Never panics, even on a range that
/// failed [`ThresholdProfile::validate`].
fn clamp_range(value: f64, (lo, hi): (f64, f64)) -> f64 {
    value.max(lo).min(hi)
}

/// Currently active thresholds for one subject.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveThresholds {
    /// Maximum horizontal gaze ratio still considered on-screen.
    pub focus: f64,
    /// Maximum vertical gaze ratio still considered on-screen.
    pub vertical: f64,
    /// Average EAR below which the eyes count as closed.
    pub ear: f64,
}

/// Head-forward threshold: lenient close-up, stricter far away.
#[must_use]
pub fn head_threshold(distance: f64) -> f64 {
    if distance < 1.0 {
        0.4 + (1.0 - distance) * 0.3
    } else {
        0.3 * (1.0 + (distance - 1.0) * 0.2)
    }
}
