//! Error types for accelerator construction.

use thiserror::Error;

/// Errors that can occur while building a BVH.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BvhError {
    /// Mesh has no vertices or no triangles.
    #[error("mesh is empty")]
    EmptyMesh,

    /// Vertex or index buffer is malformed.
    #[error("invalid index buffer: {0}")]
    InvalidIndexBuffer(String),
}

/// Result type for accelerator operations.
pub type Result<T> = std::result::Result<T, BvhError>;
