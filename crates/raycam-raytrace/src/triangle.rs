//! Ray-triangle intersection.

use raycam_math::{Point3, Vec3};

use crate::Ray;

/// Determinant below which the ray is treated as parallel to the triangle.
const PARALLEL_EPS: f64 = 1e-12;

/// Slack on barycentric bounds so shared edges do not leak rays between
/// adjacent triangles.
const EDGE_EPS: f64 = 1e-10;

/// Intersect a ray with a triangle using the Möller–Trumbore algorithm.
///
/// Returns `(t, u, v)` where `u` and `v` are the barycentric weights of `v1`
/// and `v2`. Both faces of the triangle are reported; culling is left to the
/// caller. Only hits with `ray.t_min < t < ray.t_max` count.
pub fn intersect_triangle(ray: &Ray, v0: &Point3, v1: &Point3, v2: &Point3) -> Option<(f64, f64, f64)> {
    let e1 = v1 - v0;
    let e2 = v2 - v0;
    let dir = ray.direction.as_ref();

    let p = dir.cross(&e2);
    let det = e1.dot(&p);
    if det.abs() < PARALLEL_EPS {
        return None;
    }
    let inv_det = 1.0 / det;

    let s = ray.origin - v0;
    let u = s.dot(&p) * inv_det;
    if !(-EDGE_EPS..=1.0 + EDGE_EPS).contains(&u) {
        return None;
    }

    let q = s.cross(&e1);
    let v = dir.dot(&q) * inv_det;
    if v < -EDGE_EPS || u + v > 1.0 + EDGE_EPS {
        return None;
    }

    let t = e2.dot(&q) * inv_det;
    if t <= ray.t_min || t >= ray.t_max {
        return None;
    }

    Some((t, u, v))
}

/// Unnormalized geometric normal `(v1 - v0) × (v2 - v0)`.
///
/// Points toward the side from which the vertices appear counter-clockwise
/// in a right-handed frame.
#[inline]
pub fn triangle_normal(v0: &Point3, v1: &Point3, v2: &Point3) -> Vec3 {
    (v1 - v0).cross(&(v2 - v0))
}
