//! Head pose estimation from six facial anchors.
//!
//! Fits a canonical 3-D face model to the observed anchors with a pinhole
//! camera (focal length = frame width, principal point = frame centre, no
//! distortion) by minimizing reprojection error with Levenberg-Marquardt over
//! a rotation vector and translation, then decomposes the rotation into
//! yaw/pitch/roll degrees.

use nalgebra::{Matrix3, Matrix6, Point2, Point3, Rotation3, SMatrix, SVector, Vector3, Vector6};
use tracing::debug;

use crate::domain::{mesh, FaceLandmarks, HeadPose};

/// Anchor landmarks, paired with [`MODEL_POINTS`].
const ANCHORS: [usize; 6] = [
    mesh::NOSE_TIP,
    mesh::CHIN,
    mesh::EYE_OUTER_IMAGE_LEFT,
    mesh::EYE_OUTER_IMAGE_RIGHT,
    mesh::MOUTH_IMAGE_LEFT,
    mesh::MOUTH_IMAGE_RIGHT,
];

/// Canonical face model in millimetres (y up, nose tip at the origin).
const MODEL_POINTS: [[f64; 3]; 6] = [
    [0.0, 0.0, 0.0],
    [0.0, -90.0, -10.0],
    [-60.0, 40.0, -30.0],
    [60.0, 40.0, -30.0],
    [-40.0, -40.0, -30.0],
    [40.0, -40.0, -30.0],
];

/// Model distance between the two eye anchors.
const MODEL_EYE_SPAN: f64 = 120.0;

const MAX_ITERATIONS: usize = 200;
const SINGULAR_EPS: f64 = 1e-6;

type Residuals = SVector<f64, 12>;
type Jacobian = SMatrix<f64, 12, 6>;

/// Pinhole intrinsics.
#[derive(Debug, Clone, Copy)]
struct Camera {
    focal: f64,
    cx: f64,
    cy: f64,
}

impl Camera {
    fn for_frame(width: u32, height: u32) -> Self {
        let w = f64::from(width);
        Self {
            focal: w,
            cx: w / 2.0,
            cy: f64::from(height) / 2.0,
        }
    }

    /// Projects a camera-space point; `None` if it is not in front of the camera.
    fn project(&self, p: &Point3<f64>) -> Option<Point2<f64>> {
        (p.z > f64::EPSILON).then(|| {
            Point2::new(
                self.focal * p.x / p.z + self.cx,
                self.focal * p.y / p.z + self.cy,
            )
        })
    }
}

/// Estimates head pose in degrees.
///
/// Returns the zero pose if any anchor is missing, the frame has no width, or
/// the solver does not converge to a finite solution with the face in front
/// of the camera. Deterministic for identical input.
#[must_use]
pub fn estimate_head_pose(landmarks: &FaceLandmarks) -> HeadPose {
    estimate_within(landmarks, MAX_ITERATIONS)
}

fn estimate_within(landmarks: &FaceLandmarks, max_iterations: usize) -> HeadPose {
    let Some(anchors) = landmarks.select(ANCHORS) else {
        return HeadPose::default();
    };
    if landmarks.frame_width() == 0 {
        return HeadPose::default();
    }
    let image_points = anchors.map(|lm| lm.snapped().xy());
    let camera = Camera::for_frame(landmarks.frame_width(), landmarks.frame_height());

    match solve_pnp(&image_points, &camera, max_iterations) {
        Some(rotation) => euler_degrees(&rotation),
        None => {
            debug!("head pose solver did not converge, reporting zero pose");
            HeadPose::default()
        }
    }
}

fn model_points() -> [Point3<f64>; 6] {
    MODEL_POINTS.map(|[x, y, z]| Point3::new(x, y, z))
}

fn rotation_of(params: &Vector6<f64>) -> Rotation3<f64> {
    Rotation3::new(Vector3::new(params[0], params[1], params[2]))
}

fn residuals(
    params: &Vector6<f64>,
    model: &[Point3<f64>; 6],
    observed: &[Point2<f64>; 6],
    camera: &Camera,
) -> Option<Residuals> {
    let rotation = rotation_of(params);
    let translation = Vector3::new(params[3], params[4], params[5]);
    let mut r = Residuals::zeros();
    for (i, (x, uv)) in model.iter().zip(observed).enumerate() {
        let projected = camera.project(&(rotation * x + translation))?;
        r[2 * i] = projected.x - uv.x;
        r[2 * i + 1] = projected.y - uv.y;
    }
    Some(r)
}

/// Initial guess: face squarely toward the camera, depth from eye span.
fn initial_guess(observed: &[Point2<f64>; 6], camera: &Camera) -> Option<Vector6<f64>> {
    let eye_span = nalgebra::distance(&observed[2], &observed[3]);
    if eye_span <= f64::EPSILON {
        return None;
    }
    let tz = camera.focal * MODEL_EYE_SPAN / eye_span;
    let nose = observed[0];
    Some(Vector6::new(
        std::f64::consts::PI,
        0.0,
        0.0,
        (nose.x - camera.cx) * tz / camera.focal,
        (nose.y - camera.cy) * tz / camera.focal,
        tz,
    ))
}

fn numeric_jacobian(
    params: &Vector6<f64>,
    model: &[Point3<f64>; 6],
    observed: &[Point2<f64>; 6],
    camera: &Camera,
) -> Option<Jacobian> {
    let mut jacobian = Jacobian::zeros();
    for k in 0..6 {
        let step = 1e-6 * params[k].abs().max(1.0);
        let mut forward = *params;
        let mut backward = *params;
        forward[k] += step;
        backward[k] -= step;
        let column = (residuals(&forward, model, observed, camera)?
            - residuals(&backward, model, observed, camera)?)
            / (2.0 * step);
        jacobian.set_column(k, &column);
    }
    Some(jacobian)
}

/// Levenberg-Marquardt minimization of squared reprojection error.
///
/// `None` unless a stopping criterion (vanishing gradient, vanishing step or
/// negligible improvement) is met within `max_iterations`.
fn solve_pnp(
    observed: &[Point2<f64>; 6],
    camera: &Camera,
    max_iterations: usize,
) -> Option<Rotation3<f64>> {
    let model = model_points();
    let mut params = initial_guess(observed, camera)?;
    let mut r = residuals(&params, &model, observed, camera)?;
    let mut cost = r.norm_squared();
    let mut lambda = 1e-3;
    let mut converged = false;

    for _ in 0..max_iterations {
        let jacobian = numeric_jacobian(&params, &model, observed, camera)?;
        let jtj: Matrix6<f64> = jacobian.transpose() * jacobian;
        let gradient: Vector6<f64> = jacobian.transpose() * r;
        if gradient.amax() < 1e-10 * cost.max(1.0) {
            converged = true;
            break;
        }

        let damped = jtj + Matrix6::from_diagonal(&jtj.diagonal()) * lambda;
        let Some(step) = damped.cholesky().map(|c| c.solve(&(-gradient))) else {
            lambda *= 10.0;
            if lambda > 1e12 {
                break;
            }
            continue;
        };
        if step.norm() < 1e-10 * params.norm().max(1.0) {
            converged = true;
            break;
        }

        let candidate = params + step;
        match residuals(&candidate, &model, observed, camera) {
            Some(candidate_r) if candidate_r.norm_squared() < cost => {
                let improvement = cost - candidate_r.norm_squared();
                params = candidate;
                r = candidate_r;
                cost = r.norm_squared();
                lambda = (lambda / 10.0).max(1e-12);
                if improvement < 1e-12 * cost.max(1.0) {
                    converged = true;
                    break;
                }
            }
            _ => {
                lambda *= 10.0;
                if lambda > 1e12 {
                    break;
                }
            }
        }
    }

    if !converged {
        debug!(cost, lambda, "head pose solver stopped without converging");
        return None;
    }
    params
        .iter()
        .all(|p| p.is_finite())
        .then(|| rotation_of(&params))
}

/// Decomposes a rotation into (yaw, pitch, roll) degrees.
///
/// Regular case: `pitch = atan2(-R20, sy)`, `yaw = atan2(R10, R00)`,
/// `roll = atan2(R21, R22)` with `sy = sqrt(R00² + R10²)`. When `sy` is below
/// `1e-6` yaw is taken from `atan2(-R01, R11)` and roll is 0.
#[must_use]
fn euler_degrees(rotation: &Rotation3<f64>) -> HeadPose {
    euler_from_matrix(rotation.matrix())
}

fn euler_from_matrix(r: &Matrix3<f64>) -> HeadPose {
    let sy = r[(0, 0)].hypot(r[(1, 0)]);
    let pitch = (-r[(2, 0)]).atan2(sy);
    let (yaw, roll) = if sy < SINGULAR_EPS {
        ((-r[(0, 1)]).atan2(r[(1, 1)]), 0.0)
    } else {
        (r[(1, 0)].atan2(r[(0, 0)]), r[(2, 1)].atan2(r[(2, 2)]))
    };
    HeadPose {
        yaw: yaw.to_degrees(),
        pitch: pitch.to_degrees(),
        roll: roll.to_degrees(),
    }
}
