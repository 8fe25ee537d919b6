//! Face-mesh landmark provider port.

use image::DynamicImage;

use crate::domain::FaceLandmarks;

/// Port for detecting facial landmarks in a frame.
///
/// Detectors usually keep tracking state between frames, hence `&mut self`.
pub trait LandmarkProvider: Send {
    /// Detects the first face in `image`.
    ///
    /// Returns `Ok(None)` when no face is found.
    ///
    /// # Errors
    ///
    /// Returns an error if detection fails.
    fn detect(&mut self, image: &DynamicImage) -> anyhow::Result<Option<FaceLandmarks>>;
}
