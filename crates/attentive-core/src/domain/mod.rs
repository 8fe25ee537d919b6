//! Core domain types for attention analysis.

mod frame;
mod landmarks;
mod result;
mod ring_buffer;

pub use frame::{FrameRecord, SourceFrame};
pub use landmarks::{mesh, FaceLandmarks, Landmark};
pub use result::{Engagement, FrameResult, GazeDirection, HeadPose, MODEL_NOT_LOADED};
pub use ring_buffer::RingBuffer;
