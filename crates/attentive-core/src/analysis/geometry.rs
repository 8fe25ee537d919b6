//! Null-safe planar geometry helpers.
//!
//! Inputs are optional points; an absent input yields `None` or a documented
//! neutral value, never a panic.

use nalgebra::{distance, Point2};

/// Euclidean distance, or `None` if either point is absent.
#[must_use]
pub fn safe_distance(a: Option<Point2<f64>>, b: Option<Point2<f64>>) -> Option<f64> {
    Some(distance(&a?, &b?))
}

/// `num / den`, or 0.0 if the numerator is absent or the denominator is
/// absent or zero.
#[must_use]
pub fn safe_ratio(num: Option<f64>, den: Option<f64>) -> f64 {
    match (num, den) {
        (Some(num), Some(den)) if den != 0.0 => num / den,
        _ => 0.0,
    }
}

/// Treats a zero value as absent.
#[must_use]
pub fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

/// Angle at vertex `b` formed by `a` and `c`, in degrees.
///
/// Returns 0.0 if any point is absent or either arm has zero length.
#[must_use]
pub fn angle_deg(a: Option<Point2<f64>>, b: Option<Point2<f64>>, c: Option<Point2<f64>>) -> f64 {
    let (Some(a), Some(b), Some(c)) = (a, b, c) else {
        return 0.0;
    };
    let v1 = a - b;
    let v2 = c - b;
    let (n1, n2) = (v1.norm(), v2.norm());
    if n1 == 0.0 || n2 == 0.0 {
        return 0.0;
    }
    (v1.dot(&v2) / (n1 * n2)).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Signed distance from `p` to the line through `a` and `b`.
///
/// Positive on the side the left-hand normal of `a -> b` points to in image
/// coordinates. Returns 0.0 if any point is absent or `a == b`.
#[must_use]
pub fn signed_line_distance(
    p: Option<Point2<f64>>,
    a: Option<Point2<f64>>,
    b: Option<Point2<f64>>,
) -> f64 {
    let (Some(p), Some(a), Some(b)) = (p, a, b) else {
        return 0.0;
    };
    let ca = a.y - b.y;
    let cb = b.x - a.x;
    let cc = a.x * b.y - b.x * a.y;
    let denom = ca.hypot(cb);
    if denom == 0.0 {
        return 0.0;
    }
    (ca * p.x + cb * p.y + cc) / denom
}

/// Midpoint of two pixel-grid points, floored to the grid.
#[must_use]
pub fn floor_midpoint(a: Option<Point2<f64>>, b: Option<Point2<f64>>) -> Option<Point2<f64>> {
    let (a, b) = (a?, b?);
    Some(Point2::new(
        ((a.x + b.x) / 2.0).floor(),
        ((a.y + b.y) / 2.0).floor(),
    ))
}

/// Slope `dy / dx` from `from` to `to`, 0.0 if either is absent or `dx == 0`.
#[must_use]
pub fn slope(from: Option<Point2<f64>>, to: Option<Point2<f64>>) -> f64 {
    match (from, to) {
        (Some(from), Some(to)) if to.x - from.x != 0.0 => (to.y - from.y) / (to.x - from.x),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Option<Point2<f64>> {
        Some(Point2::new(x, y))
    }

    #[test]
    fn test_safe_distance() {
        assert_eq!(safe_distance(p(0.0, 0.0), p(3.0, 4.0)), Some(5.0));
        assert_eq!(safe_distance(None, p(3.0, 4.0)), None);
    }

    #[test]
    fn test_safe_ratio_degrades_to_zero() {
        assert!((safe_ratio(Some(1.0), Some(4.0)) - 0.25).abs() < f64::EPSILON);
        assert!(safe_ratio(None, Some(4.0)).abs() < f64::EPSILON);
        assert!(safe_ratio(Some(1.0), None).abs() < f64::EPSILON);
        assert!(safe_ratio(Some(1.0), Some(0.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_angle_right_angle() {
        let angle = angle_deg(p(1.0, 0.0), p(0.0, 0.0), p(0.0, 1.0));
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_angle_degenerate_arm() {
        assert!(angle_deg(p(0.0, 0.0), p(0.0, 0.0), p(0.0, 1.0)).abs() < f64::EPSILON);
        assert!(angle_deg(None, p(0.0, 0.0), p(0.0, 1.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_signed_line_distance_sides() {
        // Horizontal line left to right; image y grows downward.
        let below = signed_line_distance(p(5.0, 2.0), p(0.0, 0.0), p(10.0, 0.0));
        let above = signed_line_distance(p(5.0, -2.0), p(0.0, 0.0), p(10.0, 0.0));
        assert!((below - 2.0).abs() < 1e-12);
        assert!((above + 2.0).abs() < 1e-12);
        assert!(signed_line_distance(p(1.0, 1.0), p(0.0, 0.0), p(0.0, 0.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn test_floor_midpoint() {
        let mid = floor_midpoint(p(3.0, -3.0), p(4.0, 0.0)).unwrap_or_else(Point2::origin);
        assert!((mid.x - 3.0).abs() < f64::EPSILON);
        assert!((mid.y + 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_slope() {
        assert!((slope(p(0.0, 0.0), p(2.0, 1.0)) - 0.5).abs() < f64::EPSILON);
        assert!(slope(p(1.0, 0.0), p(1.0, 5.0)).abs() < f64::EPSILON);
    }
}
