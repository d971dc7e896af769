//! Error types for camera configuration and trajectory files.

use thiserror::Error;

/// Errors raised when a camera is constructed or mutated with bad parameters.
///
/// A camera that rejects a mutation is left exactly as it was.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    /// Width or height is zero.
    #[error("invalid image size {width}x{height}: both dimensions must be positive")]
    InvalidSize {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// Focal length or principal point unset, non-positive, or not finite.
    #[error("invalid intrinsics: {0}")]
    InvalidIntrinsics(String),

    /// Field of view outside the open interval (0, 180) degrees.
    #[error("invalid field of view {0} degrees: must be in (0, 180)")]
    InvalidFov(f64),
}

/// Errors from reading or writing trajectory files.
#[derive(Error, Debug)]
pub enum TrajectoryError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A line could not be parsed.
    #[error("line {line}: {reason}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },
}

/// Result type for camera operations.
pub type Result<T> = std::result::Result<T, CameraError>;
