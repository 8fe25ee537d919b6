//! Facial landmark types.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Well-known face-mesh landmark indices shared across analysis stages.
pub mod mesh {
    /// Nose tip.
    pub const NOSE_TIP: usize = 1;
    /// Chin.
    pub const CHIN: usize = 152;
    /// Outer corner of the eye on the image left.
    pub const EYE_OUTER_IMAGE_LEFT: usize = 33;
    /// Outer corner of the eye on the image right.
    pub const EYE_OUTER_IMAGE_RIGHT: usize = 263;
    /// Mouth corner on the image left.
    pub const MOUTH_IMAGE_LEFT: usize = 61;
    /// Mouth corner on the image right.
    pub const MOUTH_IMAGE_RIGHT: usize = 291;
    /// Number of points produced by a face mesh with iris refinement.
    pub const REFINED_POINT_COUNT: usize = 478;
}

/// A single landmark: `x`/`y` in pixels, `z` in pixels scaled by frame width.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    /// Horizontal position in pixels.
    pub x: f64,
    /// Vertical position in pixels.
    pub y: f64,
    /// Relative depth, same scale as `x`.
    pub z: f64,
}

impl Landmark {
    /// Creates a landmark from pixel coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns the landmark snapped to the integer pixel grid.
    ///
    /// Halves round to even. Depth is kept as-is.
    #[must_use]
    pub fn snapped(self) -> Self {
        Self {
            x: self.x.round_ties_even(),
            y: self.y.round_ties_even(),
            z: self.z,
        }
    }

    /// Image-plane position.
    #[must_use]
    pub fn xy(self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }
}

/// Landmarks for one detected face, with the frame they were measured in.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceLandmarks {
    points: Vec<Landmark>,
    frame_width: u32,
    frame_height: u32,
    confidence: Option<f32>,
}

impl FaceLandmarks {
    /// Creates landmarks from pixel-space points.
    #[must_use]
    pub const fn new(points: Vec<Landmark>, frame_width: u32, frame_height: u32) -> Self {
        Self {
            points,
            frame_width,
            frame_height,
            confidence: None,
        }
    }

    /// Creates landmarks from normalized `[x, y, z]` triples as emitted by
    /// face-mesh detectors (`x`, `y` in 0..1, `z` relative to face width).
    #[must_use]
    pub fn from_normalized(points: &[[f64; 3]], frame_width: u32, frame_height: u32) -> Self {
        let w = f64::from(frame_width);
        let h = f64::from(frame_height);
        let points = points
            .iter()
            .map(|&[x, y, z]| Landmark::new(x * w, y * h, z * w))
            .collect();
        Self::new(points, frame_width, frame_height)
    }

    /// Sets the detector confidence for this face.
    #[must_use]
    pub const fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Returns the landmark at `index`, or `None` if the mesh has no such point.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Landmark> {
        self.points.get(index).copied()
    }

    /// Returns the landmark at `index` snapped to the integer pixel grid.
    #[must_use]
    pub fn snapped(&self, index: usize) -> Option<Landmark> {
        self.get(index).map(Landmark::snapped)
    }

    /// Returns all landmarks at `indices`, or `None` if any is missing.
    #[must_use]
    pub fn select<const N: usize>(&self, indices: [usize; N]) -> Option<[Landmark; N]> {
        let mut out = [Landmark::default(); N];
        for (slot, index) in out.iter_mut().zip(indices) {
            *slot = self.get(index)?;
        }
        Some(out)
    }

    /// All landmarks in mesh order.
    #[must_use]
    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    /// Number of landmarks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if there are no landmarks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Width of the frame the landmarks were measured in.
    #[must_use]
    pub const fn frame_width(&self) -> u32 {
        self.frame_width
    }

    /// Height of the frame the landmarks were measured in.
    #[must_use]
    pub const fn frame_height(&self) -> u32 {
        self.frame_height
    }

    /// Detector confidence, if the detector reported one.
    #[must_use]
    pub const fn confidence(&self) -> Option<f32> {
        self.confidence
    }
}
