//! Validation and conversions shared by both camera models.

use crate::error::{CameraError, Result};

pub(crate) fn validate_size(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(CameraError::InvalidSize { width, height });
    }
    Ok(())
}

/// Focal length in pixels giving `fov_deg` across `size` pixels.
pub(crate) fn focal_from_fov(size: u32, fov_deg: f64) -> Result<f64> {
    if !fov_deg.is_finite() || fov_deg <= 0.0 || fov_deg >= 180.0 {
        return Err(CameraError::InvalidFov(fov_deg));
    }
    Ok(size as f64 * 0.5 / (fov_deg.to_radians() * 0.5).tan())
}

/// Field of view in degrees spanned by `size` pixels at focal length `focal`.
pub(crate) fn fov_from_focal(size: u32, focal: f64) -> f64 {
    (2.0 * (size as f64 * 0.5 / focal).atan()).to_degrees()
}
