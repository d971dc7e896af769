//! Per-render configuration.

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};

/// How vertex colors are combined across a triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorInterpolation {
    /// Color of the vertex with the largest barycentric weight.
    #[serde(alias = "nn")]
    Nearest,
    /// Barycentric blend of the three vertex colors.
    #[default]
    Bilinear,
}

/// Which normal the normal image reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadingNormal {
    /// Geometric normal of the hit triangle.
    Face,
    /// Barycentric blend of the hit triangle's vertex normals. Falls back to
    /// the face normal for meshes without vertex normals.
    #[default]
    Vertex,
}

/// Options applied fresh on every render call.
///
/// Loaded from TOML with every field optional:
///
/// ```toml
/// use_vertex_color = true
/// depth_scale = 1000.0
/// interp = "nearest"
/// backface_culling = false
/// shading_normal = "face"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Shade hits with per-vertex colors instead of the background color.
    pub use_vertex_color: bool,
    /// Multiplier applied to camera-space depth before 16-bit quantization.
    pub depth_scale: f64,
    /// Vertex color interpolation.
    pub interp: ColorInterpolation,
    /// Treat hits on triangles facing away from the ray as misses.
    pub backface_culling: bool,
    /// Source of the normal image.
    pub shading_normal: ShadingNormal,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            use_vertex_color: false,
            depth_scale: 1.0,
            interp: ColorInterpolation::Bilinear,
            backface_culling: true,
            shading_normal: ShadingNormal::Vertex,
        }
    }
}

impl RenderOptions {
    /// Validate options.
    pub fn validate(&self) -> Result<()> {
        if !self.depth_scale.is_finite() || self.depth_scale < 0.0 {
            return Err(RenderError::InvalidOptions(format!(
                "depth_scale must be finite and non-negative, got {}",
                self.depth_scale
            )));
        }
        Ok(())
    }

    /// Parse and validate options from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let options: Self =
            toml::from_str(text).map_err(|e| RenderError::InvalidOptions(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }
}
