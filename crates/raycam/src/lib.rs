#![warn(missing_docs)]

//! raycam - ray-cast synthetic rendering with exact camera models
//!
//! Renders triangle meshes into color, 16-bit depth, normal and mask images by
//! casting one ray per pixel. Projection, unprojection and ray generation
//! agree exactly, so rendered depth back-projects onto the mesh surface.
//!
//! This crate re-exports the workspace crates and adds the file-level
//! pieces: JSON scene documents, orbit trajectories and PNG export.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use raycam::{orbit_poses, render_frames, RenderOptions, Renderer, Scene};
//!
//! let scene = Scene::load("scene.json").unwrap();
//! let mesh = scene.to_mesh().unwrap();
//! let stats = mesh.stats().unwrap();
//!
//! let mut renderer = Renderer::new();
//! renderer.set_mesh(Arc::new(mesh));
//! renderer.prepare().unwrap();
//!
//! let frames: Vec<_> = orbit_poses(&stats, 36).into_iter().enumerate()
//!     .map(|(i, pose)| (i as i64, pose))
//!     .collect();
//! let mut camera = scene.camera.build(frames[0].1).unwrap();
//! render_frames(&renderer, &mut camera, &frames, &RenderOptions::default(), Path::new("out")).unwrap();
//! ```

use thiserror::Error;

pub mod export;
pub mod orbit;
pub mod scene;

pub use raycam_camera as camera;
pub use raycam_math as math;
pub use raycam_raytrace as raytrace;
pub use raycam_render as render;

pub use export::{depth_range, render_frames, write_frame, FramePaths};
pub use orbit::orbit_poses;
pub use raycam_camera::{Camera, CameraError, Frame, OrthoCamera, PinholeCamera, TrajectoryError};
pub use raycam_render::{
    depth_to_gray, depth_to_mesh, depth_to_point_cloud, face_id_to_color, normal_to_color,
    ColorInterpolation, MeshStats, MeshView, RenderError, RenderOptions, RenderOutput, Renderer,
    ShadingNormal, TriangleMesh,
};
pub use scene::{CameraDesc, Scene, SceneCamera};

/// Errors from loading scenes, rendering them and writing the results.
#[derive(Error, Debug)]
pub enum RaycamError {
    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The scene document is not valid JSON for a [`Scene`].
    #[error("scene JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The scene document is well-formed but inconsistent.
    #[error("invalid scene: {0}")]
    InvalidScene(String),

    /// Camera parameters were rejected.
    #[error(transparent)]
    Camera(#[from] CameraError),

    /// A trajectory file could not be read or written.
    #[error(transparent)]
    Trajectory(#[from] TrajectoryError),

    /// Preparing or rendering failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Encoding or writing an image failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type for raycam operations.
pub type Result<T> = std::result::Result<T, RaycamError>;
