//! Analysis stages of the attention pipeline.
//!
//! Every stage is deterministic given its inputs and per-subject state, and
//! degrades to documented neutral values instead of failing.

pub mod attention;
pub mod blink;
pub mod engagement;
pub mod features;
pub mod gaze;
pub mod geometry;
pub mod head_pose;
pub mod lighting;
pub mod smoothing;
pub mod thresholds;

pub use attention::{
    AttentionConfig, AttentionEvent, AttentionLogEntry, AttentionStatus, AttentionSummary,
    AttentionTracker,
};
pub use blink::{BlinkDetector, BlinkTransition, EyeState};
pub use engagement::{base_focus, engagement_for, focus_score};
pub use features::{assemble_features, extract_features, FeatureName, FeatureVector, FEATURE_COUNT};
pub use gaze::{classify_direction, GazeAnalyzer, GazeReading, GazeState};
pub use head_pose::estimate_head_pose;
pub use lighting::{assess_lighting, enhance_contrast, ClaheConfig, Histogram};
pub use smoothing::EmotionSmoother;
pub use thresholds::{head_threshold, AdaptiveThresholds, ThresholdProfile};
