//! Attentive Core - per-frame attention and engagement analysis.
//!
//! This crate turns facial landmark geometry into a stable engagement signal:
//! geometric feature extraction, head-pose estimation, gaze and blink analysis
//! with adaptive thresholds, temporal smoothing of emotion labels and the
//! emotion to engagement mapping. External collaborators (landmark detectors,
//! classifiers, clocks, frame sources and sinks) plug in through [`ports`].

pub mod analysis;
pub mod domain;
pub mod inference;
pub mod pipeline;
pub mod ports;

pub use domain::{
    Engagement, FaceLandmarks, FrameRecord, FrameResult, GazeDirection, HeadPose, Landmark,
    SourceFrame,
};
pub use pipeline::{FrameProcessor, ProcessorConfig, SessionRegistry};
pub use ports::{
    Clock, EmotionClassifier, FrameSource, LandmarkProvider, ManualClock, ProgressEvent,
    ProgressSink, ResultOutput, SystemClock,
};
