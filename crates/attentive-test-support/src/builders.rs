//! Synthetic face and frame builders for testing.

use attentive_core::analysis::gaze::{LEFT_EYE, LEFT_IRIS, RIGHT_EYE, RIGHT_IRIS};
use attentive_core::domain::mesh;
use attentive_core::{FaceLandmarks, Landmark};
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

/// Builder for a 478-point face mesh with controllable eye geometry.
///
/// The default is a 640x480 frame with a frontal face whose eyes are 80 px
/// apart at the outer corners, wide open (EAR 0.3 on normalized
/// coordinates) and looking straight ahead, without glasses.
#[derive(Debug, Clone)]
pub struct SyntheticFaceBuilder {
    width: u32,
    height: u32,
    eye_aspect_ratio: f64,
    gaze: (f64, f64),
    head_shift: (f64, f64),
    glasses: bool,
    scale: f64,
    confidence: Option<f32>,
}

impl Default for SyntheticFaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticFaceBuilder {
    /// Starts from the default face.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            width: 640,
            height: 480,
            eye_aspect_ratio: 0.3,
            gaze: (0.0, 0.0),
            head_shift: (0.0, 0.0),
            glasses: false,
            scale: 1.0,
            confidence: None,
        }
    }

    /// Sets the frame size.
    #[must_use]
    pub const fn frame(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets both eyes' aspect ratio on normalized coordinates (0 = closed).
    #[must_use]
    pub const fn eye_aspect_ratio(mut self, ear: f64) -> Self {
        self.eye_aspect_ratio = ear;
        self
    }

    /// Places both irises at the given gaze ratios (half eye extents).
    #[must_use]
    pub const fn gaze(mut self, horizontal: f64, vertical: f64) -> Self {
        self.gaze = (horizontal, vertical);
        self
    }

    /// Moves the nose tip away from the eye midline, in pixels.
    #[must_use]
    pub const fn head_shift(mut self, dx: f64, dy: f64) -> Self {
        self.head_shift = (dx, dy);
        self
    }

    /// Flattens eye depth so the eyewear heuristic fires.
    #[must_use]
    pub const fn glasses(mut self, glasses: bool) -> Self {
        self.glasses = glasses;
        self
    }

    /// Scales the face; larger faces read as closer to the camera.
    #[must_use]
    pub const fn scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Attaches a detector confidence.
    #[must_use]
    pub const fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Builds the landmarks.
    #[must_use]
    pub fn build(&self) -> FaceLandmarks {
        let s = self.scale;
        let cx = f64::from(self.width) / 2.0;
        let cy = f64::from(self.height) / 2.0;
        let eye_y = 40.0f64.mul_add(-s, cy);
        // EAR = 2·half_height·W / (H·eye width) once divided by the frame size
        let aspect = if self.width == 0 {
            1.0
        } else {
            f64::from(self.height) / f64::from(self.width)
        };
        let half_height = self.eye_aspect_ratio * 10.0 * s * aspect;

        let mut points = vec![Landmark::new(cx, 20.0f64.mul_add(s, cy), 0.0); mesh::REFINED_POINT_COUNT];

        let eyes = [
            (RIGHT_EYE, RIGHT_IRIS, 40.0f64.mul_add(-s, cx)),
            (LEFT_EYE, LEFT_IRIS, 20.0f64.mul_add(s, cx)),
        ];
        for (contour, iris, x0) in eyes {
            let w = 20.0 * s;
            let outline = [
                (x0, eye_y),
                (x0 + w / 4.0, eye_y - half_height),
                (x0 + 3.0 * w / 4.0, eye_y - half_height),
                (x0 + w, eye_y),
                (x0 + 3.0 * w / 4.0, eye_y + half_height),
                (x0 + w / 4.0, eye_y + half_height),
            ];
            for (i, (&index, (x, y))) in contour.iter().zip(outline).enumerate() {
                points[index] = Landmark::new(x, y, self.depth(i));
            }

            let iris_x = self.gaze.0.mul_add(w / 2.0, x0 + w / 2.0);
            let iris_y = self.gaze.1.mul_add(half_height, eye_y);
            let ring = [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)];
            for (&index, (dx, dy)) in iris.iter().zip(ring) {
                points[index] = Landmark::new(iris_x + dx * s, iris_y + dy * s, 0.0);
            }
        }

        points[mesh::NOSE_TIP] = Landmark::new(cx + self.head_shift.0, cy + self.head_shift.1, -20.0);
        points[mesh::CHIN] = Landmark::new(cx, 90.0f64.mul_add(s, cy), 0.0);
        points[mesh::MOUTH_IMAGE_LEFT] = Landmark::new(25.0f64.mul_add(-s, cx), 45.0f64.mul_add(s, cy), 0.0);
        points[mesh::MOUTH_IMAGE_RIGHT] = Landmark::new(25.0f64.mul_add(s, cx), 45.0f64.mul_add(s, cy), 0.0);

        let face = FaceLandmarks::new(points, self.width, self.height);
        match self.confidence {
            Some(confidence) => face.with_confidence(confidence),
            None => face,
        }
    }

    /// Alternating depth gives a normalized variance well above the eyewear cutoff.
    fn depth(&self, i: usize) -> f64 {
        if self.glasses {
            0.0
        } else if i % 2 == 0 {
            0.15 * f64::from(self.width)
        } else {
            -0.15 * f64::from(self.width)
        }
    }
}

/// Builder for synthetic frames with known lighting.
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    /// Uniform gray frame.
    #[must_use]
    pub fn uniform_gray(width: u32, height: u32, value: u8) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(width, height, Luma([value])))
    }

    /// Black and white checkerboard, the best-lit frame possible.
    #[must_use]
    pub fn checkerboard(width: u32, height: u32, cell_size: u32) -> DynamicImage {
        let cell = cell_size.max(1);
        DynamicImage::ImageLuma8(GrayImage::from_fn(width, height, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        }))
    }

    /// Dim frame with slight texture, scored as poorly lit.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn dark(width: u32, height: u32, max_brightness: u8) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(width, height, |x, y| {
            Luma([((x + y) % u32::from(max_brightness.max(1))) as u8])
        }))
    }

    /// Evenly lit frame with moderate contrast (quality 1.0).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn well_lit(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, _| {
            let v = 20 + ((x * 215) / width.max(1)) as u8;
            Rgb([v, v, v])
        }))
    }
}
