//! Per-subject frame orchestration.
//!
//! A [`FrameProcessor`] owns one subject's history and runs every frame
//! through lighting assessment, landmark acquisition, feature extraction,
//! classification, smoothing and gaze analysis. A [`SessionRegistry`] keeps
//! one processor per subject and shares the classifier and clock between
//! them.

mod config;
mod processor;
mod registry;
mod state;

pub use config::ProcessorConfig;
pub use processor::{decode_base64_image, FrameProcessor, DECODE_FAILED};
pub use registry::SessionRegistry;
pub use state::TrackState;
