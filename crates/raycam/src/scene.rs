//! JSON scene documents: a mesh plus the camera that looks at it.
//!
//! ```json
//! {
//!   "vertices": [[-1, -1, 0], [1, -1, 0], [1, 1, 0]],
//!   "faces": [[0, 1, 2]],
//!   "colors": [[255, 0, 0], [0, 255, 0], [0, 0, 255]],
//!   "normals": [[0, 0, -1], [0, 0, -1], [0, 0, -1]],
//!   "camera": { "type": "pinhole", "width": 640, "height": 480, "fov_y": 45.0 }
//! }
//! ```
//!
//! Pinhole cameras take either `fov_y` or both `fx` and `fy`; `px`/`py`
//! default to the image center. Orthographic cameras only take a size.
//! `colors` and `normals` are optional; missing normals are computed from
//! the faces.

use std::path::Path;

use raycam_camera::{Camera, OrthoCamera, PinholeCamera};
use raycam_math::{Point2, Point3, Pose, Vec2, Vec3};
use raycam_render::TriangleMesh;
use serde::{Deserialize, Serialize};

use crate::{RaycamError, Result};

/// Vertical field of view used when a pinhole camera gives neither
/// `fov_y` nor focal lengths.
pub const DEFAULT_FOV_Y: f64 = 45.0;

/// Camera block of a scene document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CameraDesc {
    /// Perspective camera.
    Pinhole {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Vertical field of view in degrees.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fov_y: Option<f64>,
        /// Horizontal focal length in pixels.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fx: Option<f64>,
        /// Vertical focal length in pixels.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fy: Option<f64>,
        /// Principal point x in pixels.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        px: Option<f64>,
        /// Principal point y in pixels.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        py: Option<f64>,
    },
    /// Orthographic camera, one world unit per pixel.
    Ortho {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },
}

impl CameraDesc {
    /// Build the camera at pose `c2w`.
    pub fn build(&self, c2w: Pose) -> Result<SceneCamera> {
        match *self {
            CameraDesc::Pinhole {
                width,
                height,
                fov_y,
                fx,
                fy,
                px,
                py,
            } => {
                let principal_point = Point2::new(
                    px.unwrap_or(width as f64 * 0.5 - 0.5),
                    py.unwrap_or(height as f64 * 0.5 - 0.5),
                );
                let camera = match (fx, fy) {
                    (Some(fx), Some(fy)) => {
                        PinholeCamera::new(width, height, c2w, principal_point, Vec2::new(fx, fy))?
                    }
                    (None, None) => {
                        let mut camera = PinholeCamera::with_fov_y(
                            width,
                            height,
                            c2w,
                            fov_y.unwrap_or(DEFAULT_FOV_Y),
                        )?;
                        camera.set_principal_point(principal_point)?;
                        camera
                    }
                    _ => {
                        return Err(RaycamError::InvalidScene(
                            "pinhole camera needs both fx and fy, or neither".into(),
                        ))
                    }
                };
                Ok(SceneCamera::Pinhole(camera))
            }
            CameraDesc::Ortho { width, height } => {
                Ok(SceneCamera::Ortho(OrthoCamera::new(width, height, c2w)?))
            }
        }
    }
}

/// A camera built from a [`CameraDesc`], movable between renders.
#[derive(Debug, Clone)]
pub enum SceneCamera {
    /// Perspective camera.
    Pinhole(PinholeCamera),
    /// Orthographic camera.
    Ortho(OrthoCamera),
}

impl SceneCamera {
    /// Move the camera.
    pub fn set_c2w(&mut self, c2w: Pose) {
        match self {
            SceneCamera::Pinhole(camera) => camera.set_c2w(c2w),
            SceneCamera::Ortho(camera) => camera.set_c2w(c2w),
        }
    }

    /// The camera as a trait object.
    pub fn as_camera(&self) -> &dyn Camera {
        match self {
            SceneCamera::Pinhole(camera) => camera,
            SceneCamera::Ortho(camera) => camera,
        }
    }
}

/// A scene document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Vertex positions.
    pub vertices: Vec<[f64; 3]>,
    /// Triangles as vertex index triples.
    pub faces: Vec<[u32; 3]>,
    /// Optional per-vertex RGB colors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<[u8; 3]>>,
    /// Optional per-vertex normals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normals: Option<Vec<[f64; 3]>>,
    /// Camera intrinsics and image size.
    pub camera: CameraDesc,
}

impl Scene {
    /// Deserialize from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a scene file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Build the mesh, checking indices and attribute counts.
    ///
    /// Without `normals`, area-weighted vertex normals are computed.
    pub fn to_mesh(&self) -> Result<TriangleMesh> {
        let vertices = self
            .vertices
            .iter()
            .map(|&[x, y, z]| Point3::new(x, y, z))
            .collect();
        let mut mesh = TriangleMesh::new(vertices, self.faces.clone());
        if let Some(colors) = &self.colors {
            mesh = mesh.with_vertex_colors(colors.clone());
        }
        if let Some(normals) = &self.normals {
            let normals = normals.iter().map(|&[x, y, z]| Vec3::new(x, y, z)).collect();
            mesh = mesh.with_vertex_normals(normals);
        }
        mesh.validate()?;
        if self.normals.is_none() {
            mesh.compute_vertex_normals();
        }
        Ok(mesh)
    }
}
