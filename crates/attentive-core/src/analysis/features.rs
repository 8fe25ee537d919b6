//! Geometric facial feature extraction.
//!
//! Produces the fixed-order feature vector the emotion classifier was trained
//! on. Names, order and formulas are a contract with the trained weights: a
//! formula change does not fail, it silently degrades classification.
//!
//! Landmarks are snapped to the integer pixel grid first and every distance is
//! normalized by the nose-bridge reference span (points 4 and 6), so features
//! are independent of the subject's distance from the camera.

use std::ops::Index;

use super::geometry::{
    angle_deg, floor_midpoint, nonzero, safe_distance, safe_ratio, signed_line_distance, slope,
};
use super::head_pose::estimate_head_pose;
use crate::domain::{FaceLandmarks, HeadPose};

/// Number of features in a [`FeatureVector`].
pub const FEATURE_COUNT: usize = 37;

/// Name of each feature slot, in classifier training order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(usize)]
pub enum FeatureName {
    MouthMovement,
    MouthAspectRatio,
    LipCornerDistance,
    JawDrop,
    LeftEyeMovement,
    RightEyeMovement,
    LeftEyebrowMovement,
    RightEyebrowMovement,
    LeftEyebrowSlope,
    RightEyebrowSlope,
    EyebrowAsymmetry,
    NostrilFlare,
    NoseTipMovement,
    LeftCheekPosition,
    RightCheekPosition,
    JawWidth,
    MouthEyeRatio,
    PoseYaw,
    PosePitch,
    PoseRoll,
    LeftEyeEar,
    RightEyeEar,
    EyeAsymmetry,
    InterocularNorm,
    MouthCornerSlope,
    MouthCurvature,
    SmileIntensity,
    BrowEyeDistLeft,
    BrowEyeDistRight,
    BrowEyeAsymmetry,
    CheekAsymmetry,
    JawAngleDeg,
    NoseToMouth,
    NoseToChinNorm,
    FaceWidthNorm,
    FaceHeightNorm,
    FaceWhRatio,
}

impl FeatureName {
    /// All features in training order.
    pub const ALL: [Self; FEATURE_COUNT] = [
        Self::MouthMovement,
        Self::MouthAspectRatio,
        Self::LipCornerDistance,
        Self::JawDrop,
        Self::LeftEyeMovement,
        Self::RightEyeMovement,
        Self::LeftEyebrowMovement,
        Self::RightEyebrowMovement,
        Self::LeftEyebrowSlope,
        Self::RightEyebrowSlope,
        Self::EyebrowAsymmetry,
        Self::NostrilFlare,
        Self::NoseTipMovement,
        Self::LeftCheekPosition,
        Self::RightCheekPosition,
        Self::JawWidth,
        Self::MouthEyeRatio,
        Self::PoseYaw,
        Self::PosePitch,
        Self::PoseRoll,
        Self::LeftEyeEar,
        Self::RightEyeEar,
        Self::EyeAsymmetry,
        Self::InterocularNorm,
        Self::MouthCornerSlope,
        Self::MouthCurvature,
        Self::SmileIntensity,
        Self::BrowEyeDistLeft,
        Self::BrowEyeDistRight,
        Self::BrowEyeAsymmetry,
        Self::CheekAsymmetry,
        Self::JawAngleDeg,
        Self::NoseToMouth,
        Self::NoseToChinNorm,
        Self::FaceWidthNorm,
        Self::FaceHeightNorm,
        Self::FaceWhRatio,
    ];

    /// Position of this feature in the vector.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Training-time column name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MouthMovement => "mouth_movement",
            Self::MouthAspectRatio => "mouth_aspect_ratio",
            Self::LipCornerDistance => "lip_corner_distance",
            Self::JawDrop => "jaw_drop",
            Self::LeftEyeMovement => "left_eye_movement",
            Self::RightEyeMovement => "right_eye_movement",
            Self::LeftEyebrowMovement => "left_eyebrow_movement",
            Self::RightEyebrowMovement => "right_eyebrow_movement",
            Self::LeftEyebrowSlope => "left_eyebrow_slope",
            Self::RightEyebrowSlope => "right_eyebrow_slope",
            Self::EyebrowAsymmetry => "eyebrow_asymmetry",
            Self::NostrilFlare => "nostril_flare",
            Self::NoseTipMovement => "nose_tip_movement",
            Self::LeftCheekPosition => "left_cheek_position",
            Self::RightCheekPosition => "right_cheek_position",
            Self::JawWidth => "jaw_width",
            Self::MouthEyeRatio => "mouth_eye_ratio",
            Self::PoseYaw => "pose_yaw",
            Self::PosePitch => "pose_pitch",
            Self::PoseRoll => "pose_roll",
            Self::LeftEyeEar => "left_eye_ear",
            Self::RightEyeEar => "right_eye_ear",
            Self::EyeAsymmetry => "eye_asymmetry",
            Self::InterocularNorm => "interocular_norm",
            Self::MouthCornerSlope => "mouth_corner_slope",
            Self::MouthCurvature => "mouth_curvature",
            Self::SmileIntensity => "smile_intensity",
            Self::BrowEyeDistLeft => "brow_eye_dist_left",
            Self::BrowEyeDistRight => "brow_eye_dist_right",
            Self::BrowEyeAsymmetry => "brow_eye_asymmetry",
            Self::CheekAsymmetry => "cheek_asymmetry",
            Self::JawAngleDeg => "jaw_angle_deg",
            Self::NoseToMouth => "nose_to_mouth",
            Self::NoseToChinNorm => "nose_to_chin_norm",
            Self::FaceWidthNorm => "face_width_norm",
            Self::FaceHeightNorm => "face_height_norm",
            Self::FaceWhRatio => "face_wh_ratio",
        }
    }
}

/// Fixed-length feature vector in training order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f32; FEATURE_COUNT],
}

impl FeatureVector {
    /// A vector of zeros.
    #[must_use]
    pub const fn zeros() -> Self {
        Self {
            values: [0.0; FEATURE_COUNT],
        }
    }

    /// Builds a vector from raw values in training order.
    #[must_use]
    pub const fn from_values(values: [f32; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    /// Value of one feature.
    #[must_use]
    pub const fn get(&self, name: FeatureName) -> f32 {
        self.values[name.index()]
    }

    #[allow(clippy::cast_possible_truncation)]
    fn set(&mut self, name: FeatureName, value: f64) {
        self.values[name.index()] = value as f32;
    }

    /// Values in training order.
    #[must_use]
    pub const fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Iterates `(name, value)` pairs in training order.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureName, f32)> + '_ {
        FeatureName::ALL.iter().map(|&name| (name, self.get(name)))
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::zeros()
    }
}

impl Index<FeatureName> for FeatureVector {
    type Output = f32;

    fn index(&self, name: FeatureName) -> &f32 {
        &self.values[name.index()]
    }
}

/// Extracts the feature vector, estimating head pose along the way.
#[must_use]
pub fn extract_features(landmarks: &FaceLandmarks) -> FeatureVector {
    let pose = estimate_head_pose(landmarks);
    assemble_features(landmarks, &pose)
}

/// Extracts the feature vector using an already estimated head pose.
#[must_use]
pub fn assemble_features(landmarks: &FaceLandmarks, pose: &HeadPose) -> FeatureVector {
    use FeatureName as F;

    let pt = |i: usize| landmarks.snapped(i).map(|lm| lm.xy());
    let dist = |a: usize, b: usize| safe_distance(pt(a), pt(b));

    let reference = dist(4, 6);
    // Divisor for the eye and brow terms: the reference span, or 1 when unusable.
    let reference_or_one = nonzero(reference).unwrap_or(1.0);
    let norm = |value: Option<f64>| safe_ratio(value, reference);

    let mouth_width = dist(61, 291);
    let left_eye_width = dist(33, 133);
    let right_eye_width = dist(362, 263);

    let mouth_height = dist(13, 14);
    let left_eye_height = dist(159, 145);
    let right_eye_height = dist(386, 374);

    let mut v = FeatureVector::zeros();

    // Mouth
    v.set(F::MouthMovement, norm(mouth_height));
    v.set(F::MouthAspectRatio, safe_ratio(mouth_height, mouth_width));
    v.set(F::LipCornerDistance, norm(mouth_width));
    v.set(F::JawDrop, norm(dist(152, 14)));

    // Eyes
    let left_ear = safe_ratio(left_eye_height, left_eye_width);
    let right_ear = safe_ratio(right_eye_height, right_eye_width);
    v.set(F::LeftEyeMovement, left_ear / reference_or_one);
    v.set(F::RightEyeMovement, right_ear / reference_or_one);

    // Brows
    let left_brow = safe_ratio(dist(65, 33), left_eye_width) / reference_or_one;
    let right_brow = safe_ratio(dist(295, 263), right_eye_width) / reference_or_one;
    v.set(F::LeftEyebrowMovement, left_brow);
    v.set(F::RightEyebrowMovement, right_brow);
    v.set(F::LeftEyebrowSlope, slope(pt(65), pt(159)));
    v.set(F::RightEyebrowSlope, slope(pt(295), pt(386)));
    v.set(F::EyebrowAsymmetry, (left_brow - right_brow).abs());

    // Nose
    v.set(F::NostrilFlare, norm(dist(98, 327)));
    v.set(F::NoseTipMovement, norm(dist(1, 4)));

    // Cheeks and jaw
    let left_cheek = norm(dist(230, 295));
    let right_cheek = norm(dist(450, 426));
    v.set(F::LeftCheekPosition, left_cheek);
    v.set(F::RightCheekPosition, right_cheek);
    v.set(F::JawWidth, norm(dist(234, 454)));

    let interocular = norm(dist(33, 263));
    v.set(F::MouthEyeRatio, safe_ratio(mouth_height, nonzero(Some(interocular))));

    v.set(F::PoseYaw, pose.yaw);
    v.set(F::PosePitch, pose.pitch);
    v.set(F::PoseRoll, pose.roll);

    v.set(F::LeftEyeEar, left_ear);
    v.set(F::RightEyeEar, right_ear);
    v.set(F::EyeAsymmetry, (left_ear - right_ear).abs());
    v.set(F::InterocularNorm, interocular);

    // Mouth shape
    v.set(F::MouthCornerSlope, slope(pt(61), pt(291)));
    let mouth_mid = floor_midpoint(pt(13), pt(14));
    let smile = mouth_mid.map_or(0.0, |mid| signed_line_distance(Some(mid), pt(61), pt(291)));
    v.set(F::MouthCurvature, safe_ratio(Some(smile.abs()), mouth_width));
    v.set(F::SmileIntensity, safe_ratio(Some(smile), mouth_width));

    // Brow to eye centre
    let left_eye_center = floor_midpoint(pt(33), pt(133));
    let right_eye_center = floor_midpoint(pt(362), pt(263));
    let brow_eye_left =
        safe_ratio(safe_distance(pt(65), left_eye_center), left_eye_width) / reference_or_one;
    let brow_eye_right =
        safe_ratio(safe_distance(pt(295), right_eye_center), right_eye_width) / reference_or_one;
    v.set(F::BrowEyeDistLeft, brow_eye_left);
    v.set(F::BrowEyeDistRight, brow_eye_right);
    v.set(F::BrowEyeAsymmetry, (brow_eye_left - brow_eye_right).abs());

    v.set(F::CheekAsymmetry, (left_cheek - right_cheek).abs());
    v.set(F::JawAngleDeg, angle_deg(pt(234), pt(152), pt(454)));

    v.set(F::NoseToMouth, norm(dist(1, 13)));
    v.set(F::NoseToChinNorm, norm(dist(1, 152)));

    // Global face shape
    let face_width = dist(234, 454);
    let face_height = if pt(10).is_some() && pt(152).is_some() {
        dist(10, 152)
    } else {
        dist(1, 152)
    };
    v.set(F::FaceWidthNorm, norm(face_width));
    v.set(F::FaceHeightNorm, norm(face_height));
    v.set(F::FaceWhRatio, safe_ratio(face_width, nonzero(face_height)));

    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Landmark;

    const EXPECTED_ORDER: [&str; FEATURE_COUNT] = [
        "mouth_movement",
        "mouth_aspect_ratio",
        "lip_corner_distance",
        "jaw_drop",
        "left_eye_movement",
        "right_eye_movement",
        "left_eyebrow_movement",
        "right_eyebrow_movement",
        "left_eyebrow_slope",
        "right_eyebrow_slope",
        "eyebrow_asymmetry",
        "nostril_flare",
        "nose_tip_movement",
        "left_cheek_position",
        "right_cheek_position",
        "jaw_width",
        "mouth_eye_ratio",
        "pose_yaw",
        "pose_pitch",
        "pose_roll",
        "left_eye_ear",
        "right_eye_ear",
        "eye_asymmetry",
        "interocular_norm",
        "mouth_corner_slope",
        "mouth_curvature",
        "smile_intensity",
        "brow_eye_dist_left",
        "brow_eye_dist_right",
        "brow_eye_asymmetry",
        "cheek_asymmetry",
        "jaw_angle_deg",
        "nose_to_mouth",
        "nose_to_chin_norm",
        "face_width_norm",
        "face_height_norm",
        "face_wh_ratio",
    ];

    /// Integer-coordinate face with hand-checkable distances.
    fn golden_face() -> FaceLandmarks {
        let mut points = vec![Landmark::new(0.0, 0.0, 0.0); 478];
        let mut put = |i: usize, x: f64, y: f64| points[i] = Landmark::new(x, y, 0.0);
        put(4, 100.0, 100.0);
        put(6, 100.0, 70.0); // reference span 30
        put(1, 100.0, 110.0);
        put(13, 100.0, 150.0);
        put(14, 100.0, 156.0); // mouth height 6
        put(61, 80.0, 153.0);
        put(291, 120.0, 153.0); // mouth width 40
        put(152, 100.0, 196.0);
        put(10, 100.0, 16.0);
        put(33, 60.0, 60.0);
        put(133, 80.0, 60.0); // left eye width 20
        put(159, 70.0, 57.0);
        put(145, 70.0, 63.0); // left eye height 6
        put(362, 120.0, 60.0);
        put(263, 140.0, 60.0); // right eye width 20
        put(386, 130.0, 58.0);
        put(374, 130.0, 62.0); // right eye height 4
        put(65, 60.0, 40.0);
        put(295, 140.0, 40.0);
        put(98, 91.0, 108.0);
        put(327, 109.0, 108.0);
        put(234, 40.0, 100.0);
        put(454, 160.0, 100.0);
        put(230, 70.0, 80.0);
        put(450, 130.0, 80.0);
        put(426, 125.0, 125.0);
        FaceLandmarks::new(points, 200, 220)
    }

    fn assert_feature(v: &FeatureVector, name: FeatureName, expected: f64) {
        let got = f64::from(v.get(name));
        assert!(
            (got - expected).abs() < 1e-5,
            "{}: expected {expected}, got {got}",
            name.as_str()
        );
    }

    #[test]
    fn test_feature_count_and_order() {
        assert_eq!(FeatureName::ALL.len(), FEATURE_COUNT);
        for (i, name) in FeatureName::ALL.iter().enumerate() {
            assert_eq!(name.index(), i);
            assert_eq!(name.as_str(), EXPECTED_ORDER[i]);
        }
    }

    #[test]
    fn test_vector_length_is_constant() {
        let empty = FaceLandmarks::new(Vec::new(), 640, 480);
        assert_eq!(extract_features(&empty).as_slice().len(), FEATURE_COUNT);
        assert_eq!(extract_features(&golden_face()).as_slice().len(), FEATURE_COUNT);
    }

    #[test]
    fn test_golden_mouth_features() {
        let v = assemble_features(&golden_face(), &HeadPose::default());
        assert_feature(&v, FeatureName::MouthMovement, 6.0 / 30.0);
        assert_feature(&v, FeatureName::MouthAspectRatio, 6.0 / 40.0);
        assert_feature(&v, FeatureName::LipCornerDistance, 40.0 / 30.0);
        assert_feature(&v, FeatureName::JawDrop, 40.0 / 30.0);
        assert_feature(&v, FeatureName::MouthCornerSlope, 0.0);
        // Floored mouth midpoint (100, 153) lies on the corner line.
        assert_feature(&v, FeatureName::MouthCurvature, 0.0);
        assert_feature(&v, FeatureName::SmileIntensity, 0.0);
    }

    #[test]
    fn test_golden_eye_features() {
        let v = assemble_features(&golden_face(), &HeadPose::default());
        assert_feature(&v, FeatureName::LeftEyeEar, 0.3);
        assert_feature(&v, FeatureName::RightEyeEar, 0.2);
        assert_feature(&v, FeatureName::EyeAsymmetry, 0.1);
        assert_feature(&v, FeatureName::LeftEyeMovement, 0.3 / 30.0);
        assert_feature(&v, FeatureName::RightEyeMovement, 0.2 / 30.0);
        assert_feature(&v, FeatureName::InterocularNorm, 80.0 / 30.0);
        assert_feature(&v, FeatureName::MouthEyeRatio, 6.0 / (80.0 / 30.0));
    }

    #[test]
    fn test_golden_brow_features() {
        let v = assemble_features(&golden_face(), &HeadPose::default());
        // Brow 65 sits 20px above eye corner 33; eye width 20.
        assert_feature(&v, FeatureName::LeftEyebrowMovement, 1.0 / 30.0);
        assert_feature(&v, FeatureName::RightEyebrowMovement, 1.0 / 30.0);
        assert_feature(&v, FeatureName::EyebrowAsymmetry, 0.0);
        // (57 - 40) / (70 - 60)
        assert_feature(&v, FeatureName::LeftEyebrowSlope, 1.7);
        // (58 - 40) / (130 - 140)
        assert_feature(&v, FeatureName::RightEyebrowSlope, -1.8);
        // Left eye centre (70, 60): distance to brow sqrt(100 + 400).
        let left = 500f64.sqrt() / 20.0 / 30.0;
        assert_feature(&v, FeatureName::BrowEyeDistLeft, left);
        assert_feature(&v, FeatureName::BrowEyeDistRight, left);
        assert_feature(&v, FeatureName::BrowEyeAsymmetry, 0.0);
    }

    #[test]
    fn test_golden_face_shape_features() {
        let v = assemble_features(&golden_face(), &HeadPose::default());
        assert_feature(&v, FeatureName::NostrilFlare, 18.0 / 30.0);
        assert_feature(&v, FeatureName::NoseTipMovement, 10.0 / 30.0);
        assert_feature(&v, FeatureName::JawWidth, 4.0);
        assert_feature(&v, FeatureName::FaceWidthNorm, 4.0);
        assert_feature(&v, FeatureName::FaceHeightNorm, 6.0);
        assert_feature(&v, FeatureName::FaceWhRatio, 120.0 / 180.0);
        assert_feature(&v, FeatureName::NoseToMouth, 40.0 / 30.0);
        assert_feature(&v, FeatureName::NoseToChinNorm, 86.0 / 30.0);
        // Jaw arms (-60, -96) and (60, -96).
        let expected_angle = 2.0 * (60f64).atan2(96.0).to_degrees();
        assert_feature(&v, FeatureName::JawAngleDeg, expected_angle);
    }

    #[test]
    fn test_golden_cheek_features() {
        let v = assemble_features(&golden_face(), &HeadPose::default());
        let left = (70f64 * 70.0 + 40.0 * 40.0).sqrt() / 30.0;
        let right = (5f64 * 5.0 + 45.0 * 45.0).sqrt() / 30.0;
        assert_feature(&v, FeatureName::LeftCheekPosition, left);
        assert_feature(&v, FeatureName::RightCheekPosition, right);
        assert_feature(&v, FeatureName::CheekAsymmetry, (left - right).abs());
    }

    #[test]
    fn test_pose_copied_into_vector() {
        let pose = HeadPose {
            yaw: 1.5,
            pitch: -2.0,
            roll: 179.0,
        };
        let v = assemble_features(&golden_face(), &pose);
        assert_feature(&v, FeatureName::PoseYaw, 1.5);
        assert_feature(&v, FeatureName::PosePitch, -2.0);
        assert_feature(&v, FeatureName::PoseRoll, 179.0);
    }

    #[test]
    fn test_smile_sign_follows_mouth_midpoint() {
        let mut face = golden_face().points().to_vec();
        // Lower both lip points: midpoint below the corner line.
        face[13] = Landmark::new(100.0, 160.0, 0.0);
        face[14] = Landmark::new(100.0, 164.0, 0.0);
        let v = assemble_features(&FaceLandmarks::new(face, 200, 220), &HeadPose::default());
        assert_feature(&v, FeatureName::SmileIntensity, 9.0 / 40.0);
        assert_feature(&v, FeatureName::MouthCurvature, 9.0 / 40.0);
    }

    #[test]
    fn test_missing_reference_degrades_to_zero() {
        let mut points = golden_face().points().to_vec();
        points.truncate(5); // drops point 6 and everything above
        let v = assemble_features(&FaceLandmarks::new(points, 200, 220), &HeadPose::default());
        assert!(v.as_slice().iter().all(|x| x.is_finite()));
        assert_feature(&v, FeatureName::MouthMovement, 0.0);
        assert_feature(&v, FeatureName::FaceWhRatio, 0.0);
    }

    #[test]
    fn test_zero_face_height_degrades_ratio() {
        let mut points = golden_face().points().to_vec();
        points[10] = points[152];
        let v = assemble_features(&FaceLandmarks::new(points, 200, 220), &HeadPose::default());
        assert_feature(&v, FeatureName::FaceWhRatio, 0.0);
    }

    #[test]
    fn test_subpixel_noise_is_snapped() {
        let noisy: Vec<Landmark> = golden_face()
            .points()
            .iter()
            .map(|lm| Landmark::new(lm.x + 0.2, lm.y - 0.3, lm.z))
            .collect();
        let a = assemble_features(&golden_face(), &HeadPose::default());
        let b = assemble_features(&FaceLandmarks::new(noisy, 200, 220), &HeadPose::default());
        assert_eq!(a, b);
    }
}
