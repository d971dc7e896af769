//! Conversions on rendered images: visualizations, point clouds and meshes.

use image::{GrayImage, Rgb, RgbImage};
use raycam_camera::Camera;
use raycam_math::{Point2, Point3};

use crate::error::{RenderError, Result};
use crate::mesh::TriangleMesh;
use crate::renderer::{DepthImage, FaceIdImage, NormalImage, NO_FACE};

/// Map depth linearly from `[min_d, max_d]` to gray `[0, 255]`.
///
/// Depth is in the same scaled units as the image. Values outside the range
/// are clamped; pixels with zero depth (misses) stay black.
pub fn depth_to_gray(depth: &DepthImage, min_d: f64, max_d: f64) -> Result<GrayImage> {
    if !(min_d.is_finite() && max_d.is_finite() && min_d < max_d) {
        return Err(RenderError::InvalidDepthRange {
            min: min_d,
            max: max_d,
        });
    }
    let inv_range = 1.0 / (max_d - min_d);

    Ok(GrayImage::from_fn(depth.width(), depth.height(), |x, y| {
        let d = depth.get_pixel(x, y).0[0];
        if d == 0 {
            return image::Luma([0]);
        }
        let norm = ((d as f64 - min_d) * inv_range).clamp(0.0, 1.0);
        image::Luma([(norm * 255.0) as u8])
    }))
}

/// Color-code camera-frame normals.
///
/// x and y in `[-1, 1]` map to red and green `[0, 255]`; z in `[0, -1]`
/// (facing the camera) maps to blue `[128, 255]`. Misses, with a zero
/// normal, come out as `(128, 128, 128)`.
pub fn normal_to_color(normal: &NormalImage) -> RgbImage {
    let to_u8 = |v: f32| v.round().clamp(0.0, 255.0) as u8;
    RgbImage::from_fn(normal.width(), normal.height(), |x, y| {
        let [nx, ny, nz] = normal.get_pixel(x, y).0;
        Rgb([
            to_u8((nx + 1.0) * 0.5 * 255.0),
            to_u8((ny + 1.0) * 0.5 * 255.0),
            to_u8((-nz * 127.0).round() + 128.0),
        ])
    })
}

/// Give every face id a fixed pseudo-random color; misses stay black.
///
/// The color depends only on the id, so a face keeps its color across
/// frames and runs.
pub fn face_id_to_color(face_id: &FaceIdImage) -> RgbImage {
    RgbImage::from_fn(face_id.width(), face_id.height(), |x, y| {
        match face_id.get_pixel(x, y).0[0] {
            NO_FACE => Rgb([0, 0, 0]),
            id => Rgb(id_color(id)),
        }
    })
}

/// splitmix64 of the id, low three bytes.
fn id_color(id: u32) -> [u8; 3] {
    let mut z = (id as u64).wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^= z >> 31;
    [z as u8, (z >> 8) as u8, (z >> 16) as u8]
}

/// Unproject every non-zero depth pixel into camera-space points.
///
/// Depth values are divided by `depth_scale` to undo the scaling applied at
/// render time. Points are returned in row-major pixel order.
pub fn depth_to_point_cloud(
    depth: &DepthImage,
    camera: &dyn Camera,
    depth_scale: f64,
) -> Result<Vec<Point3>> {
    let expected = (camera.width(), camera.height());
    let actual = depth.dimensions();
    if expected != actual {
        return Err(RenderError::SizeMismatch { expected, actual });
    }
    if !(depth_scale.is_finite() && depth_scale > 0.0) {
        return Err(RenderError::InvalidOptions(format!(
            "depth_scale must be positive to unproject, got {depth_scale}"
        )));
    }

    let points = depth
        .enumerate_pixels()
        .filter(|(_, _, d)| d.0[0] != 0)
        .map(|(x, y, d)| {
            let z = d.0[0] as f64 / depth_scale;
            camera.unproject(&Point2::new(x as f64, y as f64), z)
        })
        .collect();
    Ok(points)
}

/// Triangulate a depth image into a camera-space mesh.
///
/// Pixels are sampled every `x_step` columns and `y_step` rows starting at
/// `(0, 0)`. Each sampled pixel with non-zero depth becomes a vertex. A grid
/// cell gets a triangle for each half whose corners are all present and
/// whose depths differ from the cell's lower-right corner by less than
/// `max_connect_z_diff` (in camera units, after dividing by `depth_scale`).
/// Triangles face the camera. Vertex normals are computed.
pub fn depth_to_mesh(
    depth: &DepthImage,
    camera: &dyn Camera,
    depth_scale: f64,
    max_connect_z_diff: f64,
    x_step: u32,
    y_step: u32,
) -> Result<TriangleMesh> {
    let expected = (camera.width(), camera.height());
    let actual = depth.dimensions();
    if expected != actual {
        return Err(RenderError::SizeMismatch { expected, actual });
    }
    if !(depth_scale.is_finite() && depth_scale > 0.0) {
        return Err(RenderError::InvalidOptions(format!(
            "depth_scale must be positive to unproject, got {depth_scale}"
        )));
    }
    if max_connect_z_diff.is_nan() || max_connect_z_diff < 0.0 {
        return Err(RenderError::InvalidOptions(format!(
            "max_connect_z_diff must be non-negative, got {max_connect_z_diff}"
        )));
    }
    if x_step == 0 || y_step == 0 {
        return Err(RenderError::InvalidOptions(format!(
            "steps must be positive, got ({x_step}, {y_step})"
        )));
    }

    let (width, height) = actual;
    let z_at = |x: u32, y: u32| depth.get_pixel(x, y).0[0] as f64 / depth_scale;
    let mut vertex_at: Vec<Option<u32>> = vec![None; width as usize * height as usize];
    let slot = |x: u32, y: u32| y as usize * width as usize + x as usize;

    let mut vertices = Vec::new();
    let mut faces = Vec::new();
    for y in (0..height).step_by(y_step as usize) {
        for x in (0..width).step_by(x_step as usize) {
            if depth.get_pixel(x, y).0[0] == 0 {
                continue;
            }
            let z = z_at(x, y);
            let current = vertices.len() as u32;
            vertices.push(camera.unproject(&Point2::new(x as f64, y as f64), z));
            vertex_at[slot(x, y)] = Some(current);

            if x < x_step || y < y_step {
                continue;
            }
            let (px, py) = (x - x_step, y - y_step);
            let near = |nx: u32, ny: u32| {
                vertex_at[slot(nx, ny)].filter(|_| (z_at(nx, ny) - z).abs() < max_connect_z_diff)
            };
            let upper_left = near(px, py);
            let upper = near(x, py);
            let left = near(px, y);

            if let (Some(ul), Some(up)) = (upper_left, upper) {
                faces.push([ul, current, up]);
            }
            if let (Some(ul), Some(lf)) = (upper_left, left) {
                faces.push([ul, lf, current]);
            }
        }
    }

    log::debug!(
        "depth mesh: {} vertices, {} triangles",
        vertices.len(),
        faces.len()
    );
    let mut mesh = TriangleMesh::new(vertices, faces);
    mesh.compute_vertex_normals();
    Ok(mesh)
}
