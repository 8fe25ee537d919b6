//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the attention pipeline and
//! external adapters: landmark detectors, emotion classifiers, clocks, frame
//! sources and result sinks.

mod classifier;
mod clock;
mod frame_source;
mod landmark_provider;
mod progress;
mod result_output;

pub use classifier::EmotionClassifier;
pub use clock::{Clock, ManualClock, SystemClock};
pub use frame_source::FrameSource;
pub use landmark_provider::LandmarkProvider;
pub use progress::{ProgressEvent, ProgressSink};
pub use result_output::ResultOutput;
