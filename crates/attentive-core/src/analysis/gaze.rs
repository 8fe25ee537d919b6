//! Gaze and attention analysis.
//!
//! Combines eye aspect ratio, iris position, head position and per-subject
//! history (distance, eyewear, blink state) into a focus decision and an
//! eight-way gaze direction.

use nalgebra::{distance, Point2};
use serde::Serialize;
use tracing::debug;

use super::blink::{BlinkDetector, DEFAULT_MAX_BLINK_DURATION};
use super::thresholds::{head_threshold, AdaptiveThresholds, ThresholdProfile};
use crate::domain::{mesh, FaceLandmarks, GazeDirection, RingBuffer};

/// Contour of the eye on the image right: outer, two upper, inner, two lower.
pub const LEFT_EYE: [usize; 6] = [362, 385, 387, 263, 373, 380];
/// Contour of the eye on the image left: outer, two upper, inner, two lower.
pub const RIGHT_EYE: [usize; 6] = [33, 160, 158, 133, 153, 144];
/// Iris ring of the eye on the image right.
pub const LEFT_IRIS: [usize; 4] = [474, 475, 476, 477];
/// Iris ring of the eye on the image left.
pub const RIGHT_IRIS: [usize; 4] = [469, 470, 471, 472];

/// Frames of distance estimates averaged per subject.
pub const DISTANCE_HISTORY_LEN: usize = 30;

/// Inter-eye pixel distance at the optimal viewing distance.
const OPTIMAL_EYE_DISTANCE: f64 = 70.0;
const DISTANCE_RANGE: (f64, f64) = (0.4, 2.5);
/// Normalized depth variance below which eyewear is assumed.
const GLASSES_VARIANCE: f64 = 0.01;

/// Per-subject gaze state carried across frames.
#[derive(Debug, Clone)]
pub struct GazeState {
    distance_history: RingBuffer<f64>,
    face_distance: f64,
    wearing_glasses: bool,
    thresholds: AdaptiveThresholds,
    blink: BlinkDetector,
}

impl GazeState {
    /// Creates the initial state: optimal distance, no eyewear.
    #[must_use]
    pub fn new(profile: &ThresholdProfile, max_blink_duration: f64) -> Self {
        Self {
            distance_history: RingBuffer::new(DISTANCE_HISTORY_LEN),
            face_distance: 1.0,
            wearing_glasses: false,
            thresholds: profile.adapt(1.0, false, 1.0),
            blink: BlinkDetector::new(max_blink_duration),
        }
    }

    /// Smoothed distance ratio.
    #[must_use]
    pub const fn face_distance(&self) -> f64 {
        self.face_distance
    }

    /// Latest eyewear estimate.
    #[must_use]
    pub const fn wearing_glasses(&self) -> bool {
        self.wearing_glasses
    }

    /// Thresholds computed for the most recent frame.
    #[must_use]
    pub const fn thresholds(&self) -> AdaptiveThresholds {
        self.thresholds
    }

    /// Raw distance estimates, oldest first.
    #[must_use]
    pub const fn distance_history(&self) -> &RingBuffer<f64> {
        &self.distance_history
    }

    /// Blink state machine.
    #[must_use]
    pub const fn blink(&self) -> &BlinkDetector {
        &self.blink
    }
}

impl Default for GazeState {
    fn default() -> Self {
        Self::new(&ThresholdProfile::default(), DEFAULT_MAX_BLINK_DURATION)
    }
}

/// Outcome of gaze analysis for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GazeReading {
    /// Whether the subject is looking at the screen.
    pub is_focused: bool,
    /// Gaze direction, `None` when the eye contours were unavailable.
    pub direction: Option<GazeDirection>,
    /// Average eye aspect ratio.
    pub eye_openness: f64,
    /// Eyewear estimate after this frame.
    pub wearing_glasses: bool,
    /// Smoothed distance ratio after this frame.
    pub face_distance: f64,
    /// Thresholds used for this frame.
    pub thresholds: AdaptiveThresholds,
    /// Whether the eyes were in a blink.
    pub is_blink: bool,
    /// Average horizontal gaze ratio.
    pub horizontal: f64,
    /// Average vertical gaze ratio.
    pub vertical: f64,
}

/// Stateless analyzer; per-subject history lives in [`GazeState`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GazeAnalyzer {
    profile: ThresholdProfile,
}

impl GazeAnalyzer {
    /// Creates an analyzer with the given threshold profile.
    #[must_use]
    pub const fn new(profile: ThresholdProfile) -> Self {
        Self { profile }
    }

    /// Threshold profile in use.
    #[must_use]
    pub const fn profile(&self) -> &ThresholdProfile {
        &self.profile
    }

    /// Analyzes one frame of landmarks.
    ///
    /// `lighting` is the smoothed lighting quality and `now` the clock time in
    /// seconds. Updates eyewear, distance, thresholds and blink state.
    pub fn analyze(
        &self,
        landmarks: &FaceLandmarks,
        state: &mut GazeState,
        lighting: f64,
        now: f64,
    ) -> GazeReading {
        if let Some(glasses) = detect_glasses(landmarks) {
            state.wearing_glasses = glasses;
        }
        if let Some(d) = estimate_distance(landmarks) {
            state.distance_history.push(d);
        }
        state.face_distance = state.distance_history.mean().unwrap_or(1.0);
        state.thresholds =
            self.profile
                .adapt(state.face_distance, state.wearing_glasses, lighting);
        let thresholds = state.thresholds;

        let (Some(left_eye), Some(right_eye)) = (
            eye_contour(landmarks, LEFT_EYE),
            eye_contour(landmarks, RIGHT_EYE),
        ) else {
            debug!("eye contour incomplete, gaze unavailable");
            return GazeReading {
                is_focused: false,
                direction: None,
                eye_openness: 0.0,
                wearing_glasses: state.wearing_glasses,
                face_distance: state.face_distance,
                thresholds,
                is_blink: false,
                horizontal: 0.0,
                vertical: 0.0,
            };
        };

        let (left_h, left_v) = gaze_ratio(&left_eye, iris_centroid(landmarks, LEFT_IRIS));
        let (right_h, right_v) = gaze_ratio(&right_eye, iris_centroid(landmarks, RIGHT_IRIS));
        let avg_ear = mean2(
            eye_aspect_ratio(&normalize(&left_eye, landmarks)),
            eye_aspect_ratio(&normalize(&right_eye, landmarks)),
        );
        let is_blink = state.blink.update(avg_ear, thresholds.ear, now);

        let (head_h, head_v) = head_deviation(landmarks);
        let head_limit = head_threshold(state.face_distance);
        let head_forward = head_h < head_limit && head_v < head_limit;

        let avg_h = mean2(left_h, right_h);
        let avg_v = mean2(left_v, right_v);
        let gaze_centered = left_h.abs() < thresholds.focus && right_h.abs() < thresholds.focus;

        let is_focused = if avg_ear < thresholds.ear && !is_blink {
            false
        } else if is_blink {
            true
        } else if avg_v.abs() > thresholds.vertical {
            false
        } else {
            gaze_centered && head_forward
        };
        let direction = classify_direction(avg_h, avg_v, &thresholds);

        debug!(
            direction = %direction,
            h = avg_h,
            v = avg_v,
            ear = avg_ear,
            is_blink,
            head_forward,
            is_focused,
            "gaze analyzed"
        );

        GazeReading {
            is_focused,
            direction: Some(direction),
            eye_openness: avg_ear,
            wearing_glasses: state.wearing_glasses,
            face_distance: state.face_distance,
            thresholds,
            is_blink,
            horizontal: avg_h,
            vertical: avg_v,
        }
    }
}

/// Eight-way direction from averaged ratios; vertical deviation wins.
#[must_use]
pub fn classify_direction(avg_h: f64, avg_v: f64, thresholds: &AdaptiveThresholds) -> GazeDirection {
    let horizontal = avg_h.abs() > thresholds.focus;
    let leftward = avg_h < 0.0;
    if avg_v.abs() > thresholds.vertical {
        let up = avg_v < -thresholds.vertical;
        match (up, horizontal, leftward) {
            (true, true, true) => GazeDirection::UpLeft,
            (true, true, false) => GazeDirection::UpRight,
            (true, false, _) => GazeDirection::Up,
            (false, true, true) => GazeDirection::DownLeft,
            (false, true, false) => GazeDirection::DownRight,
            (false, false, _) => GazeDirection::Down,
        }
    } else if horizontal {
        if leftward {
            GazeDirection::Left
        } else {
            GazeDirection::Right
        }
    } else {
        GazeDirection::Center
    }
}

fn eye_contour(landmarks: &FaceLandmarks, indices: [usize; 6]) -> Option<[Point2<f64>; 6]> {
    landmarks.select(indices).map(|points| points.map(|lm| lm.xy()))
}

/// Divides points by the frame size; EAR thresholds are calibrated on
/// normalized coordinates. Left untouched for a zero-sized frame.
fn normalize(eye: &[Point2<f64>; 6], landmarks: &FaceLandmarks) -> [Point2<f64>; 6] {
    let width = f64::from(landmarks.frame_width());
    let height = f64::from(landmarks.frame_height());
    if width == 0.0 || height == 0.0 {
        return *eye;
    }
    eye.map(|p| Point2::new(p.x / width, p.y / height))
}

fn iris_centroid(landmarks: &FaceLandmarks, indices: [usize; 4]) -> Option<Point2<f64>> {
    let points = landmarks.select(indices)?;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), lm| (sx + lm.x, sy + lm.y));
    Some(Point2::new(sx / 4.0, sy / 4.0))
}

/// `(|p1−p5| + |p2−p4|) / (2·|p0−p3|)`, 0 when the eye has no width.
#[must_use]
pub fn eye_aspect_ratio(eye: &[Point2<f64>; 6]) -> f64 {
    let horizontal = distance(&eye[0], &eye[3]);
    if horizontal == 0.0 {
        return 0.0;
    }
    (distance(&eye[1], &eye[5]) + distance(&eye[2], &eye[4])) / (2.0 * horizontal)
}

/// Iris offset from the eye bounding-box centre, per axis, in half extents.
///
/// `(0, 0)` if the iris is missing or the box is degenerate.
#[must_use]
pub fn gaze_ratio(eye: &[Point2<f64>; 6], iris: Option<Point2<f64>>) -> (f64, f64) {
    let Some(iris) = iris else {
        return (0.0, 0.0);
    };
    let (min_x, max_x) = extent(eye.iter().map(|p| p.x));
    let (min_y, max_y) = extent(eye.iter().map(|p| p.y));
    let (width, height) = (max_x - min_x, max_y - min_y);
    if width == 0.0 || height == 0.0 {
        return (0.0, 0.0);
    }
    let center = Point2::new(mean2(min_x, max_x), mean2(min_y, max_y));
    (
        (iris.x - center.x) / (width / 2.0),
        (iris.y - center.y) / (height / 2.0),
    )
}

fn mean2(a: f64, b: f64) -> f64 {
    (a + b) / 2.0
}

fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Nose offset from the eye midpoint, normalized by half the frame extent.
fn head_deviation(landmarks: &FaceLandmarks) -> (f64, f64) {
    let (Some(nose), Some(a), Some(b)) = (
        landmarks.get(mesh::NOSE_TIP),
        landmarks.get(mesh::EYE_OUTER_IMAGE_LEFT),
        landmarks.get(mesh::EYE_OUTER_IMAGE_RIGHT),
    ) else {
        return (0.0, 0.0);
    };
    let half_w = f64::from(landmarks.frame_width()) / 2.0;
    let half_h = f64::from(landmarks.frame_height()) / 2.0;
    if half_w == 0.0 || half_h == 0.0 {
        return (0.0, 0.0);
    }
    (
        (nose.x - mean2(a.x, b.x)).abs() / half_w,
        (nose.y - mean2(a.y, b.y)).abs() / half_h,
    )
}

/// Distance ratio from the inter-eye pixel distance; larger is farther.
#[must_use]
pub fn estimate_distance(landmarks: &FaceLandmarks) -> Option<f64> {
    let a = landmarks.get(mesh::EYE_OUTER_IMAGE_LEFT)?;
    let b = landmarks.get(mesh::EYE_OUTER_IMAGE_RIGHT)?;
    let pixels = distance(&a.xy(), &b.xy());
    Some((OPTIMAL_EYE_DISTANCE / pixels.max(1.0)).clamp(DISTANCE_RANGE.0, DISTANCE_RANGE.1))
}

/// Eyewear heuristic: flat eye regions in depth suggest lenses.
///
/// `None` if a contour point is missing or the frame has no width.
#[must_use]
pub fn detect_glasses(landmarks: &FaceLandmarks) -> Option<bool> {
    let width = f64::from(landmarks.frame_width());
    if width == 0.0 {
        return None;
    }
    let left = depth_variance(&landmarks.select(LEFT_EYE)?.map(|lm| lm.z / width));
    let right = depth_variance(&landmarks.select(RIGHT_EYE)?.map(|lm| lm.z / width));
    Some(mean2(left, right) < GLASSES_VARIANCE)
}

/// Population variance.
fn depth_variance(values: &[f64; 6]) -> f64 {
    let mean = values.iter().sum::<f64>() / 6.0;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 6.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Landmark;

    /// Frontal 640x480 face with eye boxes 20 px wide, `ear` measured on
    /// normalized coordinates and iris offsets in ratio units.
    fn face(ear: f64, h: f64, v: f64, glasses: bool) -> FaceLandmarks {
        face_with_lids(ear * 7.5, h, v, glasses)
    }

    /// Same face with the lids `hh` pixels above and below the eye line.
    fn face_with_lids(hh: f64, h: f64, v: f64, glasses: bool) -> FaceLandmarks {
        let mut points = vec![Landmark::new(320.0, 300.0, 0.0); mesh::REFINED_POINT_COUNT];
        let depth = |i: usize| {
            if glasses {
                0.0
            } else if i % 2 == 0 {
                96.0
            } else {
                -96.0
            }
        };
        for (contour, iris, x0) in [(RIGHT_EYE, RIGHT_IRIS, 280.0), (LEFT_EYE, LEFT_IRIS, 340.0)] {
            let coords = [
                (x0, 200.0),
                (x0 + 5.0, 200.0 - hh),
                (x0 + 15.0, 200.0 - hh),
                (x0 + 20.0, 200.0),
                (x0 + 15.0, 200.0 + hh),
                (x0 + 5.0, 200.0 + hh),
            ];
            for (i, (&idx, (x, y))) in contour.iter().zip(coords).enumerate() {
                points[idx] = Landmark::new(x, y, depth(i));
            }
            let (cx, cy) = (x0 + 10.0 + h * 10.0, 200.0 + v * hh);
            let ring = [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)];
            for (&idx, (dx, dy)) in iris.iter().zip(ring) {
                points[idx] = Landmark::new(cx + dx, cy + dy, 0.0);
            }
        }
        points[mesh::NOSE_TIP] = Landmark::new(320.0, 240.0, 0.0);
        FaceLandmarks::new(points, 640, 480)
    }

    fn analyze(face: &FaceLandmarks, state: &mut GazeState, now: f64) -> GazeReading {
        GazeAnalyzer::default().analyze(face, state, 1.0, now)
    }

    // === Measurement Tests ===

    #[test]
    fn test_ear_and_ratio_of_synthetic_eye() {
        let face = face(0.3, 0.5, -0.5, false);
        let eye = eye_contour(&face, RIGHT_EYE).unwrap_or([Point2::origin(); 6]);
        assert!((eye_aspect_ratio(&normalize(&eye, &face)) - 0.3).abs() < 1e-9);
        assert!((eye_aspect_ratio(&eye) - 0.225).abs() < 1e-9);
        let (h, v) = gaze_ratio(&eye, iris_centroid(&face, RIGHT_IRIS));
        assert!((h - 0.5).abs() < 1e-9);
        assert!((v + 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_zero_without_iris() {
        let face = face(0.3, 0.5, 0.0, false);
        let eye = eye_contour(&face, RIGHT_EYE).unwrap_or([Point2::origin(); 6]);
        assert_eq!(gaze_ratio(&eye, None), (0.0, 0.0));
    }

    #[test]
    fn test_ratio_zero_for_flat_eye() {
        let eye = [Point2::new(1.0, 5.0); 6];
        assert_eq!(gaze_ratio(&eye, Some(Point2::new(3.0, 5.0))), (0.0, 0.0));
        assert!(eye_aspect_ratio(&eye).abs() < f64::EPSILON);
    }

    #[test]
    fn test_distance_from_eye_span() {
        let d = estimate_distance(&face(0.3, 0.0, 0.0, false)).unwrap_or_default();
        assert!((d - 0.875).abs() < 1e-9);
    }

    #[test]
    fn test_distance_clamped() {
        let mut points = vec![Landmark::default(); 300];
        points[33] = Landmark::new(100.0, 100.0, 0.0);
        points[263] = Landmark::new(100.0, 100.0, 0.0);
        let far = FaceLandmarks::new(points, 640, 480);
        assert!((estimate_distance(&far).unwrap_or_default() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_glasses_from_flat_depth() {
        assert_eq!(detect_glasses(&face(0.3, 0.0, 0.0, true)), Some(true));
        assert_eq!(detect_glasses(&face(0.3, 0.0, 0.0, false)), Some(false));
    }

    // === Direction Tests ===

    #[test]
    fn test_direction_vertical_priority() {
        let t = ThresholdProfile::default().adapt(1.0, false, 1.0);
        assert_eq!(classify_direction(0.0, 0.0, &t), GazeDirection::Center);
        assert_eq!(classify_direction(-0.5, 0.0, &t), GazeDirection::Left);
        assert_eq!(classify_direction(0.5, 0.0, &t), GazeDirection::Right);
        assert_eq!(classify_direction(0.0, -0.5, &t), GazeDirection::Up);
        assert_eq!(classify_direction(0.0, 0.5, &t), GazeDirection::Down);
        assert_eq!(classify_direction(-0.5, -0.5, &t), GazeDirection::UpLeft);
        assert_eq!(classify_direction(0.5, -0.5, &t), GazeDirection::UpRight);
        assert_eq!(classify_direction(-0.5, 0.5, &t), GazeDirection::DownLeft);
        assert_eq!(classify_direction(0.5, 0.5, &t), GazeDirection::DownRight);
    }

    // === Focus Decision Tests ===

    #[test]
    fn test_centered_gaze_is_focused() {
        let mut state = GazeState::default();
        let reading = analyze(&face(0.3, 0.0, 0.0, false), &mut state, 0.0);
        assert!(reading.is_focused);
        assert_eq!(reading.direction, Some(GazeDirection::Center));
        assert!((reading.eye_openness - 0.3).abs() < 1e-9);
        assert!(!reading.wearing_glasses);
    }

    #[test]
    fn test_vertical_gaze_is_unfocused() {
        let mut state = GazeState::default();
        let down = analyze(&face(0.3, 0.0, 0.5, false), &mut state, 0.0);
        assert!(!down.is_focused);
        assert_eq!(down.direction, Some(GazeDirection::Down));
        let up = analyze(&face(0.3, 0.0, -0.5, false), &mut state, 0.1);
        assert!(!up.is_focused);
        assert_eq!(up.direction, Some(GazeDirection::Up));
    }

    #[test]
    fn test_sideways_gaze_is_unfocused() {
        let mut state = GazeState::default();
        let reading = analyze(&face(0.3, 0.6, 0.0, false), &mut state, 0.0);
        assert!(!reading.is_focused);
        assert_eq!(reading.direction, Some(GazeDirection::Right));
    }

    #[test]
    fn test_blink_counts_as_focused_until_too_long() {
        let mut state = GazeState::default();
        analyze(&face(0.3, 0.0, 0.0, false), &mut state, 0.0);
        let blink = analyze(&face(0.1, 0.0, 0.0, false), &mut state, 1.0);
        assert!(blink.is_blink);
        assert!(blink.is_focused);
        let closed = analyze(&face(0.1, 0.0, 0.0, false), &mut state, 1.5);
        assert!(!closed.is_blink);
        assert!(!closed.is_focused);
    }

    #[test]
    fn test_ear_uses_normalized_coordinates() {
        // 20 px wide, lids 1.8 px off the line: 0.18 in pixels, 0.24 normalized
        let open = face_with_lids(1.8, 0.0, 0.0, false);
        let mut state = GazeState::default();
        for now in [0.0, 1.0] {
            let reading = analyze(&open, &mut state, now);
            assert!((reading.eye_openness - 0.24).abs() < 1e-9);
            assert!(reading.eye_openness > reading.thresholds.ear);
            assert!(!reading.is_blink);
            assert!(reading.is_focused);
        }
    }

    #[test]
    fn test_normalize_keeps_points_for_empty_frame() {
        let eye = [Point2::new(3.0, 4.0); 6];
        let empty = FaceLandmarks::new(Vec::new(), 0, 0);
        assert_eq!(normalize(&eye, &empty), eye);
    }

    #[test]
    fn test_head_turned_is_unfocused() {
        let mut landmarks = face(0.3, 0.0, 0.0, false).points().to_vec();
        landmarks[mesh::NOSE_TIP] = Landmark::new(560.0, 240.0, 0.0);
        let turned = FaceLandmarks::new(landmarks, 640, 480);
        let mut state = GazeState::default();
        let reading = analyze(&turned, &mut state, 0.0);
        assert!(!reading.is_focused);
        assert_eq!(reading.direction, Some(GazeDirection::Center));
    }

    #[test]
    fn test_missing_contour_is_unavailable() {
        let sparse = FaceLandmarks::new(vec![Landmark::new(1.0, 1.0, 0.0); 300], 640, 480);
        let mut state = GazeState::default();
        let reading = analyze(&sparse, &mut state, 0.0);
        assert!(!reading.is_focused);
        assert!(reading.direction.is_none());
        assert!(reading.eye_openness.abs() < f64::EPSILON);
    }

    #[test]
    fn test_distance_history_smooths() {
        let mut state = GazeState::default();
        for i in 0..40 {
            analyze(&face(0.3, 0.0, 0.0, false), &mut state, f64::from(i));
        }
        assert_eq!(state.distance_history().len(), DISTANCE_HISTORY_LEN);
        assert!((state.face_distance() - 0.875).abs() < 1e-9);
    }

    #[test]
    fn test_glasses_kept_when_points_missing() {
        let mut state = GazeState::default();
        analyze(&face(0.3, 0.0, 0.0, true), &mut state, 0.0);
        assert!(state.wearing_glasses());
        let sparse = FaceLandmarks::new(vec![Landmark::default(); 300], 640, 480);
        analyze(&sparse, &mut state, 0.1);
        assert!(state.wearing_glasses());
    }
}
