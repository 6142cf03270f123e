use crate::core::models::hkl::HKL;
use nalgebra::{Point3, Vector3};

/// Wraps a fractional point into `[0, 1)` and returns the cell it came from.
///
/// The invariant is `point == wrapped + hkl`.
pub fn wrap_fractional(point: &Vector3<f64>) -> (Vector3<f64>, HKL) {
    let floor = point.map(f64::floor);
    let mut wrapped = point - floor;
    // `x - floor(x)` can round up to exactly 1.0 for tiny negative x.
    for v in wrapped.iter_mut() {
        if *v >= 1.0 {
            *v = 0.0;
        }
    }
    let hkl = HKL::round(&(point - wrapped));
    (wrapped, hkl)
}

/// Shortest periodic representative of a fractional displacement.
pub fn minimum_image(delta: &Vector3<f64>) -> Vector3<f64> {
    delta - delta.map(f64::round)
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc: Vector3<f64>, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

/// Largest distance from `center` to any of `points`.
pub fn bounding_radius(center: &Point3<f64>, points: &[Point3<f64>]) -> f64 {
    points
        .iter()
        .map(|p| (p - center).norm())
        .fold(0.0, f64::max)
}

/// Smallest distance between any point of `a` and any point of `b`.
pub fn closest_distance_sq(a: &[Point3<f64>], b: &[Point3<f64>]) -> f64 {
    let mut best = f64::INFINITY;
    for pa in a {
        for pb in b {
            let d = (pa - pb).norm_squared();
            if d < best {
                best = d;
            }
        }
    }
    best
}
