//! Ray representation and basic ray-geometry tests.

use raycam_math::{Dir3, Point3, Vec3};

use crate::Aabb3;

/// Default lower bound on hit distance, to skip self-intersections at the origin.
pub const DEFAULT_T_MIN: f64 = 1e-4;

/// Default upper bound on hit distance.
pub const DEFAULT_T_MAX: f64 = 1e30;

/// A ray in 3D space defined by origin, direction and a valid `t` range.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Unit direction of the ray.
    pub direction: Dir3,
    /// Hits closer than this are ignored.
    pub t_min: f64,
    /// Hits farther than this are ignored.
    pub t_max: f64,
    /// Precomputed reciprocal of direction components for fast AABB tests.
    inv_direction: Vec3,
    /// Sign of direction components (0 if positive, 1 if negative).
    sign: [usize; 3],
}

impl Ray {
    /// Create a new ray from origin and direction.
    ///
    /// The direction will be normalized. A zero-length direction is a caller
    /// error and produces NaN components.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        Self::with_range(origin, direction, DEFAULT_T_MIN, DEFAULT_T_MAX)
    }

    /// Create a ray that only reports hits with `t_min < t < t_max`.
    pub fn with_range(origin: Point3, direction: Vec3, t_min: f64, t_max: f64) -> Self {
        let dir = Dir3::new_normalize(direction);
        let inv = Vec3::new(1.0 / dir.x, 1.0 / dir.y, 1.0 / dir.z);
        let sign = [
            if inv.x < 0.0 { 1 } else { 0 },
            if inv.y < 0.0 { 1 } else { 0 },
            if inv.z < 0.0 { 1 } else { 0 },
        ];
        Self {
            origin,
            direction: dir,
            t_min,
            t_max,
            inv_direction: inv,
            sign,
        }
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction.as_ref()
    }

    /// Test ray-AABB intersection using the slab method.
    ///
    /// Returns `Some((t_enter, t_exit))` clipped to `[0, t_max]` if the ray
    /// intersects the box, `None` otherwise. Handles infinite reciprocals for
    /// axis-aligned rays.
    #[inline]
    pub fn intersect_aabb(&self, aabb: &Aabb3) -> Option<(f64, f64)> {
        let bounds = [aabb.min, aabb.max];

        let tx1 = (bounds[self.sign[0]].x - self.origin.x) * self.inv_direction.x;
        let tx2 = (bounds[1 - self.sign[0]].x - self.origin.x) * self.inv_direction.x;

        let mut t_min = tx1;
        let mut t_max = tx2;

        let ty1 = (bounds[self.sign[1]].y - self.origin.y) * self.inv_direction.y;
        let ty2 = (bounds[1 - self.sign[1]].y - self.origin.y) * self.inv_direction.y;

        t_min = t_min.max(ty1);
        t_max = t_max.min(ty2);

        let tz1 = (bounds[self.sign[2]].z - self.origin.z) * self.inv_direction.z;
        let tz2 = (bounds[1 - self.sign[2]].z - self.origin.z) * self.inv_direction.z;

        t_min = t_min.max(tz1);
        t_max = t_max.min(tz2).min(self.t_max);

        if t_max >= t_min && t_max >= 0.0 {
            Some((t_min.max(0.0), t_max))
        } else {
            None
        }
    }
}

/// Nearest intersection of a ray with a triangle mesh.
///
/// Barycentric weights are `(1 - u - v, u, v)` for the triangle's three
/// vertices in index order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Index of the triangle that was hit.
    pub face_id: u32,
    /// Barycentric weight of the triangle's second vertex.
    pub u: f64,
    /// Barycentric weight of the triangle's third vertex.
    pub v: f64,
    /// Distance along the (unit) ray direction.
    pub t: f64,
}

impl TriangleHit {
    /// All three barycentric weights, in vertex order.
    #[inline]
    pub fn weights(&self) -> [f64; 3] {
        [1.0 - self.u - self.v, self.u, self.v]
    }
}
