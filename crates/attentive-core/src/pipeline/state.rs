//! Per-subject tracking state.

use crate::analysis::{AttentionTracker, EmotionSmoother, GazeState};
use crate::domain::RingBuffer;

use super::ProcessorConfig;

/// Frames of lighting estimates averaged per subject.
pub const LIGHTING_HISTORY_LEN: usize = 30;

/// Everything a processor remembers about its subject between frames.
#[derive(Debug, Clone)]
pub struct TrackState {
    pub(crate) gaze: GazeState,
    pub(crate) lighting_history: RingBuffer<f64>,
    pub(crate) lighting_quality: f64,
    pub(crate) smoother: EmotionSmoother,
    pub(crate) attention: AttentionTracker,
}

impl TrackState {
    /// Fresh state for a new subject.
    #[must_use]
    pub fn new(config: &ProcessorConfig) -> Self {
        Self {
            gaze: GazeState::new(&config.thresholds, config.max_blink_duration),
            lighting_history: RingBuffer::new(LIGHTING_HISTORY_LEN),
            lighting_quality: 1.0,
            smoother: EmotionSmoother::new(config.smoothing_window),
            attention: AttentionTracker::new(config.attention),
        }
    }

    /// Records a raw lighting estimate and returns the smoothed quality.
    pub(crate) fn observe_lighting(&mut self, quality: f64) -> f64 {
        self.lighting_history.push(quality);
        self.lighting_quality = self.lighting_history.mean().unwrap_or(1.0);
        self.lighting_quality
    }

    /// Gaze history: distance, eyewear, thresholds and blink state.
    #[must_use]
    pub const fn gaze(&self) -> &GazeState {
        &self.gaze
    }

    /// Smoothed lighting quality.
    #[must_use]
    pub const fn lighting_quality(&self) -> f64 {
        self.lighting_quality
    }

    /// Raw lighting estimates, oldest first.
    #[must_use]
    pub const fn lighting_history(&self) -> &RingBuffer<f64> {
        &self.lighting_history
    }

    /// Emotion prediction window.
    #[must_use]
    pub const fn smoother(&self) -> &EmotionSmoother {
        &self.smoother
    }

    /// Attention tracker.
    #[must_use]
    pub const fn attention(&self) -> &AttentionTracker {
        &self.attention
    }
}
