//! Processor configuration.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::blink::DEFAULT_MAX_BLINK_DURATION;
use crate::analysis::engagement::DEFAULT_UNFOCUSED_PENALTY;
use crate::analysis::smoothing::DEFAULT_WINDOW;
use crate::analysis::{AttentionConfig, ClaheConfig, ThresholdProfile};

/// Construction-time settings for a [`FrameProcessor`](super::FrameProcessor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Number of recent predictions the emotion vote runs over.
    pub smoothing_window: usize,
    /// Faces reported below this detector confidence count as absent.
    pub min_detection_confidence: f32,
    /// Adaptive threshold constants.
    pub thresholds: ThresholdProfile,
    /// Longest eye closure still treated as a blink, in seconds.
    pub max_blink_duration: f64,
    /// Focus reduction when gaze is off-screen.
    pub unfocused_penalty: u8,
    /// Frames with raw lighting quality below this are contrast-enhanced.
    pub enhance_below: f64,
    /// Sustained-attention tracking.
    pub attention: AttentionConfig,
    /// Contrast enhancement parameters.
    #[serde(skip)]
    pub clahe: ClaheConfig,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            smoothing_window: DEFAULT_WINDOW,
            min_detection_confidence: 0.5,
            thresholds: ThresholdProfile::default(),
            max_blink_duration: DEFAULT_MAX_BLINK_DURATION,
            unfocused_penalty: DEFAULT_UNFOCUSED_PENALTY,
            enhance_below: 0.7,
            attention: AttentionConfig::default(),
            clahe: ClaheConfig::default(),
        }
    }
}

impl ProcessorConfig {
    /// Sets the smoothing window.
    #[must_use]
    pub const fn with_smoothing_window(mut self, window: usize) -> Self {
        self.smoothing_window = window;
        self
    }

    /// Sets the minimum detection confidence.
    #[must_use]
    pub const fn with_min_detection_confidence(mut self, confidence: f32) -> Self {
        self.min_detection_confidence = confidence;
        self
    }

    /// Sets the threshold profile.
    #[must_use]
    pub const fn with_thresholds(mut self, thresholds: ThresholdProfile) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Sets the longest blink.
    #[must_use]
    pub const fn with_max_blink_duration(mut self, secs: f64) -> Self {
        self.max_blink_duration = secs;
        self
    }

    /// Sets the unfocused penalty.
    #[must_use]
    pub const fn with_unfocused_penalty(mut self, penalty: u8) -> Self {
        self.unfocused_penalty = penalty;
        self
    }

    /// Sets the enhancement cutoff.
    #[must_use]
    pub const fn with_enhance_below(mut self, quality: f64) -> Self {
        self.enhance_below = quality;
        self
    }

    /// Sets the attention tracker settings.
    #[must_use]
    pub const fn with_attention(mut self, attention: AttentionConfig) -> Self {
        self.attention = attention;
        self
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.smoothing_window >= 1,
            "smoothing window must be at least 1, got {}",
            self.smoothing_window
        );
        ensure!(
            (0.0..=1.0).contains(&self.min_detection_confidence),
            "min detection confidence must be within 0.0-1.0, got {}",
            self.min_detection_confidence
        );
        ensure!(
            self.max_blink_duration.is_finite() && self.max_blink_duration > 0.0,
            "max blink duration must be positive, got {}",
            self.max_blink_duration
        );
        ensure!(
            (0.0..=1.0).contains(&self.enhance_below),
            "enhance threshold must be within 0.0-1.0, got {}",
            self.enhance_below
        );
        ensure!(
            self.attention.alert_after > 0.0 && self.attention.log_interval > 0.0,
            "attention periods must be positive"
        );
        ensure!(
            self.attention.history_len >= 1,
            "attention history must hold at least one frame"
        );
        self.thresholds
            .validate()
            .context("invalid threshold profile")?;
        ensure!(
            self.clahe.tiles >= 1 && self.clahe.clip_limit > 0.0,
            "contrast enhancement needs at least one tile and a positive clip limit"
        );
        Ok(())
    }
}
