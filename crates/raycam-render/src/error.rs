//! Error types for rendering.

use raycam_raytrace::BvhError;
use thiserror::Error;

/// Errors that can occur while preparing or rendering.
///
/// A failed render produces no images.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// `prepare` was called before any mesh was set.
    #[error("no mesh set")]
    MeshNotSet,

    /// The mesh has no vertices or no faces.
    #[error("mesh is empty")]
    EmptyMesh,

    /// Face indices or per-vertex attributes do not fit the vertex list.
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// The accelerator could not be built.
    #[error("failed to build accelerator: {0}")]
    Accelerator(#[from] BvhError),

    /// `render` was called before a successful `prepare` on the current mesh.
    #[error("renderer not prepared; call prepare() after set_mesh()")]
    NotPrepared,

    /// `render` was called before any camera was set.
    #[error("no camera set")]
    CameraNotSet,

    /// The camera has a zero-sized image.
    #[error("invalid camera resolution {width}x{height}")]
    InvalidResolution {
        /// Camera width.
        width: u32,
        /// Camera height.
        height: u32,
    },

    /// Render options failed validation.
    #[error("invalid render options: {0}")]
    InvalidOptions(String),

    /// Depth visualization range is empty or not finite.
    #[error("invalid depth range [{min}, {max}]")]
    InvalidDepthRange {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },

    /// The render was cancelled through its cancellation flag.
    #[error("render cancelled")]
    Cancelled,

    /// An image or table does not match the camera's resolution.
    #[error("size mismatch: expected {expected:?}, got {actual:?}")]
    SizeMismatch {
        /// Expected `(width, height)`.
        expected: (u32, u32),
        /// Actual `(width, height)`.
        actual: (u32, u32),
    },
}

/// Result type for render operations.
pub type Result<T> = std::result::Result<T, RenderError>;
