//! Test support utilities for attentive.
//!
//! Provides mocks of the core ports and builders for synthetic faces and
//! frames with known geometry.
//!
//! # Example
//!
//! ```
//! use attentive_test_support::{MockLandmarkProvider, SyntheticFaceBuilder};
//!
//! // A face looking straight at the camera, and one looking down
//! let centered = SyntheticFaceBuilder::new().build();
//! let down = SyntheticFaceBuilder::new().gaze(0.0, 0.5).build();
//!
//! let detector = MockLandmarkProvider::sequence(vec![Some(centered), Some(down)]);
//! ```

mod builders;
mod mocks;

pub use builders::{SyntheticFaceBuilder, SyntheticImageBuilder};
pub use mocks::{
    MockClassifier, MockFrameSource, MockLandmarkProvider, MockProgressSink, MockResultOutput,
};
