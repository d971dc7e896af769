#![warn(missing_docs)]

//! Camera ray models for the raycam renderer.
//!
//! A camera answers three questions about its image: where a camera-space
//! point lands on it ([`Camera::project`]), which camera-space point a pixel
//! and depth came from ([`Camera::unproject`]), and which ray a pixel casts
//! ([`Camera::ray_origin`] / [`Camera::ray_direction`]).
//!
//! Two models implement the [`Camera`] trait:
//!
//! - [`PinholeCamera`] - perspective projection with pixel-unit focal length
//!   and principal point; all rays leave the optical center.
//! - [`OrthoCamera`] - parallel projection; each pixel's ray starts at its own
//!   point on the image plane and all rays share the forward direction.
//!
//! Both keep per-pixel [`RayTable`]s for integer pixel lookups. Every mutator
//! rebuilds the tables before returning, so a lookup never sees stale data.
//! Use `update` to change several parameters with a single rebuild.
//!
//! Frames are right-handed with x right, y down, z forward.
//!
//! # Example
//!
//! ```
//! use raycam_camera::{Camera, Frame, PinholeCamera};
//! use raycam_math::{Point2, Point3, Pose, Vec2};
//!
//! let camera = PinholeCamera::new(
//!     640,
//!     480,
//!     Pose::identity(),
//!     Point2::new(319.5, 239.5),
//!     Vec2::new(500.0, 500.0),
//! )
//! .unwrap();
//!
//! let (image_p, depth) = camera.project(&Point3::new(0.1, -0.2, 2.0));
//! let back = camera.unproject(&image_p, depth);
//! assert!((back - Point3::new(0.1, -0.2, 2.0)).norm() < 1e-12);
//!
//! let dir = camera.ray_direction_at(319, 239, Frame::World).unwrap();
//! assert!(dir.z > 0.99);
//! ```

mod base;
pub mod error;
mod ortho;
mod pinhole;
mod table;
pub mod trajectory;

pub use error::{CameraError, Result, TrajectoryError};
pub use ortho::{OrthoCamera, OrthoParams};
pub use pinhole::{PinholeCamera, PinholeParams};
pub use table::RayTable;

use raycam_math::{Point2, Point3, Pose, Vec3};

/// Coordinate frame a ray is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frame {
    /// Camera coordinates (x right, y down, z forward).
    Camera,
    /// World coordinates, via the camera-to-world pose.
    World,
}

/// Intrinsic and extrinsic camera geometry.
///
/// Continuous queries take floating pixel coordinates and are computed on
/// demand; the `*_at` queries take integer pixels and read the cached ray
/// tables.
pub trait Camera: Send + Sync + std::fmt::Debug {
    /// Image width in pixels.
    fn width(&self) -> u32;

    /// Image height in pixels.
    fn height(&self) -> u32;

    /// Camera-to-world pose.
    fn c2w(&self) -> &Pose;

    /// World-to-camera pose; always the exact inverse of [`Camera::c2w`].
    fn w2c(&self) -> &Pose;

    /// Project a camera-space point to image coordinates and depth.
    fn project(&self, camera_p: &Point3) -> (Point2, f64);

    /// Recover the camera-space point seen at `image_p` with `depth`.
    ///
    /// For perspective cameras `depth` must be non-zero.
    fn unproject(&self, image_p: &Point2, depth: f64) -> Point3;

    /// Origin of the ray through pixel `(x, y)`.
    fn ray_origin(&self, x: f64, y: f64, frame: Frame) -> Point3;

    /// Unit direction of the ray through pixel `(x, y)`.
    fn ray_direction(&self, x: f64, y: f64, frame: Frame) -> Vec3;

    /// Cached per-pixel rays for the current state.
    fn ray_table(&self) -> &RayTable;

    /// Project to `(x, y, depth)` packed into one point.
    fn project_point3(&self, camera_p: &Point3) -> Point3 {
        let (image_p, depth) = self.project(camera_p);
        Point3::new(image_p.x, image_p.y, depth)
    }

    /// Unproject `(x, y, depth)` packed into one point.
    fn unproject_point3(&self, image_p: &Point3) -> Point3 {
        self.unproject(&Point2::new(image_p.x, image_p.y), image_p.z)
    }

    /// Table lookup of the ray origin at an integer pixel.
    ///
    /// Returns `None` outside the image.
    fn ray_origin_at(&self, x: u32, y: u32, frame: Frame) -> Option<Point3> {
        self.ray_table().origin(x, y, frame)
    }

    /// Table lookup of the ray direction at an integer pixel.
    ///
    /// Returns `None` outside the image.
    fn ray_direction_at(&self, x: u32, y: u32, frame: Frame) -> Option<Vec3> {
        self.ray_table().direction(x, y, frame)
    }
}
