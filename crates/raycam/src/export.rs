//! PNG export of render results.
//!
//! Each rendered frame becomes five files in the output directory, named
//! by frame index:
//!
//! - `{index:05}_color.png` - 8-bit RGB
//! - `{index:05}_depth.png` - 16-bit gray, raw scaled depth
//! - `{index:05}_mask.png` - 8-bit gray, 0 or 255
//! - `{index:05}_vis_depth.png` - 8-bit gray depth visualization
//! - `{index:05}_vis_normal.png` - 8-bit RGB camera-frame normals

use std::path::{Path, PathBuf};

use raycam_math::Pose;
use raycam_render::{
    depth_to_gray, normal_to_color, DepthImage, RenderOptions, RenderOutput, Renderer,
};

use crate::scene::SceneCamera;
use crate::Result;

/// Paths of the files written for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePaths {
    /// Color image.
    pub color: PathBuf,
    /// 16-bit depth image.
    pub depth: PathBuf,
    /// Mask image.
    pub mask: PathBuf,
    /// Depth visualization.
    pub vis_depth: PathBuf,
    /// Normal visualization.
    pub vis_normal: PathBuf,
}

impl FramePaths {
    /// Paths for frame `index` inside `dir`.
    pub fn new(dir: &Path, index: i64) -> Self {
        let name = |kind: &str| dir.join(format!("{index:05}_{kind}.png"));
        Self {
            color: name("color"),
            depth: name("depth"),
            mask: name("mask"),
            vis_depth: name("vis_depth"),
            vis_normal: name("vis_normal"),
        }
    }
}

/// Smallest and largest non-zero depth, or `None` if nothing was hit.
pub fn depth_range(depth: &DepthImage) -> Option<(u16, u16)> {
    depth
        .pixels()
        .map(|p| p.0[0])
        .filter(|&d| d != 0)
        .fold(None, |range, d| match range {
            None => Some((d, d)),
            Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
        })
}

/// Write all five images of frame `index` into `dir`.
///
/// The depth visualization spans the frame's own depth range.
pub fn write_frame(output: &RenderOutput, dir: &Path, index: i64) -> Result<FramePaths> {
    let paths = FramePaths::new(dir, index);

    let (lo, hi) = depth_range(&output.depth).unwrap_or((0, 1));
    // A flat frame still needs a non-empty range
    let hi = if hi > lo { hi as f64 } else { lo as f64 + 1.0 };
    let vis_depth = depth_to_gray(&output.depth, lo as f64, hi)?;

    output.color.save(&paths.color)?;
    output.depth.save(&paths.depth)?;
    output.mask.save(&paths.mask)?;
    vis_depth.save(&paths.vis_depth)?;
    normal_to_color(&output.normal).save(&paths.vis_normal)?;

    log::debug!("wrote frame {index} to {}", dir.display());
    Ok(paths)
}

/// Render every `(index, pose)` frame with one camera and write its images
/// into `dir`.
///
/// The camera is moved to each pose in turn and left at the last one.
/// Returns the number of frames written.
pub fn render_frames(
    renderer: &Renderer,
    camera: &mut SceneCamera,
    frames: &[(i64, Pose)],
    options: &RenderOptions,
    dir: &Path,
) -> Result<usize> {
    std::fs::create_dir_all(dir)?;
    for (n, (index, pose)) in frames.iter().enumerate() {
        camera.set_c2w(*pose);
        let output = renderer.render_with(camera.as_camera(), options)?;
        write_frame(&output, dir, *index)?;
        log::info!(
            "frame {index} ({}/{}): {} visible faces",
            n + 1,
            frames.len(),
            output.visible_faces.len()
        );
    }
    Ok(frames.len())
}
