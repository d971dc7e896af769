#![warn(missing_docs)]

//! Triangle ray casting for the raycam renderer.
//!
//! This crate answers one question quickly: given a ray, which triangle of a
//! mesh does it hit first, and where on that triangle?
//!
//! # Architecture
//!
//! - [`Ray`] - Ray representation with origin, unit direction and valid range
//! - [`TriangleHit`] - Nearest-hit result with barycentric coordinates
//! - [`triangle`] - Ray-triangle intersection (Möller–Trumbore)
//! - [`bvh`] - Bounding volume hierarchy over flattened triangle buffers
//! - [`IntersectionProvider`] - The seam the renderer builds and queries
//!
//! # Example
//!
//! ```
//! use raycam_math::{Point3, Vec3};
//! use raycam_raytrace::{Bvh, IntersectionProvider, Ray};
//!
//! let vertices = [0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0];
//! let indices = [0, 1, 2];
//! let bvh = Bvh::build(&vertices, &indices).unwrap();
//!
//! let ray = Ray::new(Point3::new(0.2, 0.2, 0.0), Vec3::new(0.0, 0.0, 1.0));
//! let hit = bvh.nearest_hit(&ray).unwrap();
//! assert_eq!(hit.face_id, 0);
//! assert!((hit.t - 1.0).abs() < 1e-12);
//! ```

mod aabb;
pub mod bvh;
pub mod error;
mod ray;
pub mod triangle;

pub use aabb::Aabb3;
pub use bvh::{Bvh, BvhStats};
pub use error::{BvhError, Result};
pub use ray::{Ray, TriangleHit};

/// A spatial index over a triangle mesh that answers nearest-hit queries.
///
/// Built once from flattened buffers (`xyz` per vertex, three indices per
/// triangle) and then queried read-only, possibly from many threads at once.
pub trait IntersectionProvider: Send + Sync + Sized {
    /// Build the accelerator from flattened vertex and index buffers.
    fn build(vertices: &[f64], indices: &[u32]) -> Result<Self>;

    /// The nearest intersection with `t` inside the ray's range, if any.
    fn nearest_hit(&self, ray: &Ray) -> Option<TriangleHit>;

    /// Tree shape statistics, for providers that are hierarchies.
    fn stats(&self) -> Option<BvhStats> {
        None
    }
}

impl IntersectionProvider for Bvh {
    fn build(vertices: &[f64], indices: &[u32]) -> Result<Self> {
        Bvh::build(vertices, indices)
    }

    fn nearest_hit(&self, ray: &Ray) -> Option<TriangleHit> {
        self.trace_closest(ray)
    }

    fn stats(&self) -> Option<BvhStats> {
        Some(Bvh::stats(self))
    }
}
