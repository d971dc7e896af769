#![warn(missing_docs)]

//! Ray-cast rendering of triangle meshes into color, depth, normal and mask
//! images.
//!
//! Every pixel casts exactly one ray, taken from the camera's ray tables, and
//! keeps the nearest hit. There is no rasterization, so the images agree
//! exactly with the camera's projection model.
//!
//! # Architecture
//!
//! - [`MeshView`] - Read-only mesh access; [`TriangleMesh`] is the owned form
//! - [`RenderOptions`] - Per-call shading and depth settings, loadable from TOML
//! - [`Renderer`] - Prepares the accelerator once and renders per camera
//! - [`image_util`] - Depth, normal and face id visualization; back-projection
//!   of depth to points and meshes
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use raycam_camera::PinholeCamera;
//! use raycam_math::{look_at, Point3, Vec3};
//! use raycam_render::{RenderOptions, Renderer, TriangleMesh, MASK_HIT};
//!
//! let mut renderer = Renderer::new();
//! renderer.set_mesh(Arc::new(TriangleMesh::cube(1.0)));
//! renderer.prepare().unwrap();
//!
//! let pose = look_at(&Point3::new(0.0, 0.0, -3.0), &Point3::origin(), &Vec3::y()).unwrap();
//! let camera = PinholeCamera::with_fov_y(32, 24, pose, 60.0).unwrap();
//! let options = RenderOptions { depth_scale: 1000.0, ..Default::default() };
//!
//! let out = renderer.render_with(&camera, &options).unwrap();
//! assert_eq!(out.mask.get_pixel(16, 12).0, [MASK_HIT]);
//! assert_eq!(out.depth.get_pixel(16, 12).0, [2500]);
//! ```

pub mod error;
pub mod image_util;
pub mod mesh;
pub mod options;
pub mod renderer;

pub use error::{RenderError, Result};
pub use image_util::{
    depth_to_gray, depth_to_mesh, depth_to_point_cloud, face_id_to_color, normal_to_color,
};
pub use mesh::{MeshStats, MeshView, TriangleMesh};
pub use options::{ColorInterpolation, RenderOptions, ShadingNormal};
pub use renderer::{
    DepthImage, FaceIdImage, NormalImage, RenderOutput, Renderer, BACKGROUND, MASK_HIT, NO_FACE,
};
