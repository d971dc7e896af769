//! Per-pixel ray casting into color, depth, normal, mask and face id images.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use image::{GrayImage, ImageBuffer, Luma, Rgb32FImage, RgbImage};
use rayon::prelude::*;

use raycam_camera::{Camera, Frame};
use raycam_math::{Point3, Pose, Vec3};
use raycam_raytrace::triangle::triangle_normal;
use raycam_raytrace::{Bvh, IntersectionProvider, Ray, TriangleHit};

use crate::error::{RenderError, Result};
use crate::mesh::{validate_mesh, MeshView};
use crate::options::{ColorInterpolation, RenderOptions, ShadingNormal};

/// 16-bit single channel depth image.
pub type DepthImage = ImageBuffer<Luma<u16>, Vec<u16>>;

/// Camera-frame unit normals, zero on misses.
pub type NormalImage = Rgb32FImage;

/// Id of the face hit at each pixel, [`NO_FACE`] on misses.
pub type FaceIdImage = ImageBuffer<Luma<u32>, Vec<u32>>;

/// Face id written where nothing is hit.
pub const NO_FACE: u32 = u32::MAX;

/// Color written where nothing is hit, or when vertex colors are off.
pub const BACKGROUND: [u8; 3] = [0, 0, 0];

/// Mask value for pixels that hit the mesh.
pub const MASK_HIT: u8 = 255;

/// Absorbs floating point error in the hit distance before depth truncation,
/// so a surface at exactly 1.0 does not quantize to 0.
const DEPTH_EPS: f64 = 1e-6;

/// Images produced by one render call.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// Shaded color, [`BACKGROUND`] on misses.
    pub color: RgbImage,
    /// Camera-space z times `depth_scale`, 0 on misses.
    pub depth: DepthImage,
    /// Shading normal in the camera frame, selected by
    /// [`RenderOptions::shading_normal`].
    pub normal: NormalImage,
    /// [`MASK_HIT`] where the mesh was hit, 0 elsewhere.
    pub mask: GrayImage,
    /// Hit face per pixel.
    pub face_id: FaceIdImage,
    /// Sorted ids of faces that produced at least one hit pixel.
    pub visible_faces: Vec<u32>,
}

/// Mesh snapshot plus the accelerator built from it.
struct Prepared<A> {
    mesh: Arc<dyn MeshView>,
    accel: A,
}

/// Ray-casting renderer.
///
/// Set a mesh, [`prepare`](Renderer::prepare) it once, then render it from
/// any number of cameras. The accelerator is only rebuilt by another
/// `prepare`.
///
/// `A` is the spatial index used for nearest-hit queries.
pub struct Renderer<A: IntersectionProvider = Bvh> {
    mesh: Option<Arc<dyn MeshView>>,
    camera: Option<Arc<dyn Camera>>,
    options: RenderOptions,
    prepared: Option<Prepared<A>>,
}

impl Renderer {
    /// Create a renderer backed by a [`Bvh`].
    pub fn new() -> Self {
        Self::with_provider()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: IntersectionProvider> Renderer<A> {
    /// Create a renderer backed by provider `A`.
    pub fn with_provider() -> Self {
        Self {
            mesh: None,
            camera: None,
            options: RenderOptions::default(),
            prepared: None,
        }
    }

    /// Set the mesh to render. Invalidates any previous [`prepare`](Self::prepare).
    pub fn set_mesh(&mut self, mesh: Arc<dyn MeshView>) {
        self.mesh = Some(mesh);
        self.prepared = None;
    }

    /// Set the camera used by [`render`](Self::render).
    pub fn set_camera(&mut self, camera: Arc<dyn Camera>) {
        self.camera = Some(camera);
    }

    /// Set the options used by [`render`](Self::render).
    pub fn set_options(&mut self, options: RenderOptions) {
        self.options = options;
    }

    /// Current options.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Whether the current mesh has been prepared.
    pub fn is_prepared(&self) -> bool {
        self.prepared.is_some()
    }

    /// Flatten the mesh and build the accelerator.
    ///
    /// Must be called after [`set_mesh`](Self::set_mesh) and before any render.
    pub fn prepare(&mut self) -> Result<()> {
        self.prepared = None;
        let mesh = self.mesh.clone().ok_or(RenderError::MeshNotSet)?;
        validate_mesh(mesh.as_ref())?;

        let vertices: Vec<f64> = mesh
            .vertices()
            .iter()
            .flat_map(|p| [p.x, p.y, p.z])
            .collect();
        let indices: Vec<u32> = mesh.faces().iter().flatten().copied().collect();

        log::info!(
            "preparing mesh: {} vertices, {} triangles",
            mesh.vertices().len(),
            mesh.faces().len()
        );
        let start = Instant::now();
        let accel = A::build(&vertices, &indices)?;
        log::info!("accelerator built in {:.1?}", start.elapsed());
        if let Some(stats) = accel.stats() {
            log::info!(
                "bvh: {} leaves, {} branches, max depth {}",
                stats.num_leaf_nodes,
                stats.num_branch_nodes,
                stats.max_depth
            );
        }

        self.prepared = Some(Prepared { mesh, accel });
        Ok(())
    }

    /// Render with the stored camera and options.
    pub fn render(&self) -> Result<RenderOutput> {
        let camera = self.camera.as_deref().ok_or(RenderError::CameraNotSet)?;
        self.render_impl(camera, &self.options, None)
    }

    /// Render with an explicit camera and options, ignoring the stored ones.
    pub fn render_with(&self, camera: &dyn Camera, options: &RenderOptions) -> Result<RenderOutput> {
        self.render_impl(camera, options, None)
    }

    /// Like [`render`](Self::render), but checks `cancel` before each row and
    /// returns [`RenderError::Cancelled`] once it is set.
    pub fn render_cancellable(&self, cancel: &AtomicBool) -> Result<RenderOutput> {
        let camera = self.camera.as_deref().ok_or(RenderError::CameraNotSet)?;
        self.render_impl(camera, &self.options, Some(cancel))
    }

    fn render_impl(
        &self,
        camera: &dyn Camera,
        options: &RenderOptions,
        cancel: Option<&AtomicBool>,
    ) -> Result<RenderOutput> {
        let prepared = self.prepared.as_ref().ok_or(RenderError::NotPrepared)?;
        options.validate()?;

        let (width, height) = (camera.width(), camera.height());
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidResolution { width, height });
        }
        let table = camera.ray_table();
        if (table.width(), table.height()) != (width, height) {
            return Err(RenderError::SizeMismatch {
                expected: (width, height),
                actual: (table.width(), table.height()),
            });
        }

        let colors = if options.use_vertex_color {
            let colors = prepared.mesh.vertex_colors();
            if colors.is_none() {
                log::warn!("vertex colors requested but the mesh has none; using background");
            }
            colors
        } else {
            None
        };
        let normals = match options.shading_normal {
            ShadingNormal::Face => None,
            ShadingNormal::Vertex => {
                let normals = prepared.mesh.vertex_normals();
                if normals.is_none() {
                    log::warn!("vertex normals requested but the mesh has none; using face normals");
                }
                normals
            }
        };

        let shader = PixelShader {
            accel: &prepared.accel,
            positions: prepared.mesh.vertices(),
            faces: prepared.mesh.faces(),
            colors,
            normals,
            options,
            origins: table.origins(Frame::World),
            directions: table.directions(Frame::World),
            w2c: camera.w2c(),
        };

        let mut color = RgbImage::new(width, height);
        let mut depth = DepthImage::new(width, height);
        let mut normal = NormalImage::new(width, height);
        let mut mask = GrayImage::new(width, height);
        let mut face_id = FaceIdImage::from_pixel(width, height, Luma([NO_FACE]));

        let w = width as usize;
        let start = Instant::now();
        {
            let color_buf: &mut [u8] = &mut color;
            let depth_buf: &mut [u16] = &mut depth;
            let normal_buf: &mut [f32] = &mut normal;
            let mask_buf: &mut [u8] = &mut mask;
            let face_buf: &mut [u32] = &mut face_id;

            color_buf
                .par_chunks_mut(w * 3)
                .zip(depth_buf.par_chunks_mut(w))
                .zip(normal_buf.par_chunks_mut(w * 3))
                .zip(mask_buf.par_chunks_mut(w))
                .zip(face_buf.par_chunks_mut(w))
                .enumerate()
                .try_for_each(
                    |(y, ((((color_row, depth_row), normal_row), mask_row), face_row))| {
                        if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                            return Err(RenderError::Cancelled);
                        }
                        for x in 0..w {
                            if let Some(px) = shader.shade(y * w + x) {
                                color_row[x * 3..x * 3 + 3].copy_from_slice(&px.color);
                                depth_row[x] = px.depth;
                                normal_row[x * 3..x * 3 + 3].copy_from_slice(&px.normal);
                                mask_row[x] = MASK_HIT;
                                face_row[x] = px.face_id;
                            }
                        }
                        Ok(())
                    },
                )?;
        }
        log::debug!("rendered {width}x{height} in {:.1?}", start.elapsed());

        let mut visible_faces: Vec<u32> = face_id
            .pixels()
            .map(|p| p.0[0])
            .filter(|&id| id != NO_FACE)
            .collect();
        visible_faces.sort_unstable();
        visible_faces.dedup();

        Ok(RenderOutput {
            color,
            depth,
            normal,
            mask,
            face_id,
            visible_faces,
        })
    }
}

/// A shaded hit pixel.
struct Pixel {
    color: [u8; 3],
    depth: u16,
    normal: [f32; 3],
    face_id: u32,
}

/// Read-only state shared by every pixel of one render.
struct PixelShader<'a, A> {
    accel: &'a A,
    positions: &'a [Point3],
    faces: &'a [[u32; 3]],
    colors: Option<&'a [[u8; 3]]>,
    normals: Option<&'a [Vec3]>,
    options: &'a RenderOptions,
    origins: &'a [Point3],
    directions: &'a [Vec3],
    w2c: &'a Pose,
}

impl<A: IntersectionProvider> PixelShader<'_, A> {
    /// Trace and shade pixel `index`; `None` is a miss.
    fn shade(&self, index: usize) -> Option<Pixel> {
        let ray = Ray::new(self.origins[index], self.directions[index]);
        let hit = self.accel.nearest_hit(&ray)?;
        let [i0, i1, i2] = *self.faces.get(hit.face_id as usize)?;
        let (v0, v1, v2) = (
            &self.positions[i0 as usize],
            &self.positions[i1 as usize],
            &self.positions[i2 as usize],
        );

        let face_normal = triangle_normal(v0, v1, v2);
        if self.options.backface_culling && face_normal.dot(&*ray.direction) > 0.0 {
            return None;
        }

        let camera_p = self.w2c * ray.at(hit.t);
        let depth = quantize_depth(camera_p.z * self.options.depth_scale);

        let world_normal = match self.normals {
            Some(normals) => interpolate_normal(
                [normals[i0 as usize], normals[i1 as usize], normals[i2 as usize]],
                &hit,
            ),
            None => face_normal,
        };
        let n = (self.w2c.rotation * world_normal)
            .try_normalize(1e-12)
            .unwrap_or_else(Vec3::zeros);

        let color = match self.colors {
            Some(colors) => interpolate_color(
                [colors[i0 as usize], colors[i1 as usize], colors[i2 as usize]],
                &hit,
                self.options.interp,
            ),
            None => BACKGROUND,
        };

        Some(Pixel {
            color,
            depth,
            normal: [n.x as f32, n.y as f32, n.z as f32],
            face_id: hit.face_id,
        })
    }
}

/// Truncate a scaled depth into the 16-bit range.
fn quantize_depth(d: f64) -> u16 {
    if d.is_nan() {
        return 0;
    }
    (d + DEPTH_EPS).clamp(0.0, u16::MAX as f64) as u16
}

/// Barycentric blend of vertex normals. Not normalized.
fn interpolate_normal(vertex_normals: [Vec3; 3], hit: &TriangleHit) -> Vec3 {
    let [w0, w1, w2] = hit.weights();
    vertex_normals[0] * w0 + vertex_normals[1] * w1 + vertex_normals[2] * w2
}

fn interpolate_color(vertex_colors: [[u8; 3]; 3], hit: &TriangleHit, interp: ColorInterpolation) -> [u8; 3] {
    let weights = hit.weights();
    match interp {
        ColorInterpolation::Nearest => {
            let mut best = 0;
            for i in 1..3 {
                if weights[i] > weights[best] {
                    best = i;
                }
            }
            vertex_colors[best]
        }
        ColorInterpolation::Bilinear => {
            let mut out = [0u8; 3];
            for (c, slot) in out.iter_mut().enumerate() {
                let v: f64 = (0..3)
                    .map(|i| weights[i] * vertex_colors[i][c] as f64)
                    .sum();
                *slot = v.round().clamp(0.0, 255.0) as u8;
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::TriangleMesh;
    use raycam_camera::{OrthoCamera, PinholeCamera};
    use approx::assert_relative_eq;
    use raycam_math::{look_at, pose_from_tq, Point2, Vec2};

    const RED: [u8; 3] = [255, 0, 0];
    const GREEN: [u8; 3] = [0, 255, 0];
    const BLUE: [u8; 3] = [0, 0, 255];

    /// Quad at z = 1 facing a camera at the origin, split off-center so no
    /// pixel ray of a 2x2 camera lands on the shared edge.
    fn facing_quad() -> TriangleMesh {
        TriangleMesh::quad([
            Point3::new(-2.0, -1.0, 1.0),
            Point3::new(-2.0, 2.0, 1.0),
            Point3::new(1.5, 2.0, 1.0),
            Point3::new(1.5, -1.0, 1.0),
        ])
    }

    /// Front-facing triangle at z = 2 whose centroid is on the optical axis.
    fn rgb_triangle() -> TriangleMesh {
        TriangleMesh::new(
            vec![
                Point3::new(-1.0, -1.0, 2.0),
                Point3::new(-1.0, 2.0, 2.0),
                Point3::new(2.0, -1.0, 2.0),
            ],
            vec![[0, 1, 2]],
        )
        .with_vertex_colors(vec![RED, GREEN, BLUE])
    }

    fn axis_camera(c2w: Pose) -> PinholeCamera {
        PinholeCamera::new(1, 1, c2w, Point2::new(0.0, 0.0), Vec2::new(1.0, 1.0)).unwrap()
    }

    fn prepared(mesh: TriangleMesh) -> Renderer {
        let mut renderer = Renderer::new();
        renderer.set_mesh(Arc::new(mesh));
        renderer.prepare().unwrap();
        renderer
    }

    #[test]
    fn test_quad_fills_2x2_view() {
        let renderer = prepared(facing_quad());
        let camera =
            PinholeCamera::new(2, 2, Pose::identity(), Point2::new(0.5, 0.5), Vec2::new(1.0, 1.0))
                .unwrap();

        for scale in [1.0, 1000.0] {
            let opts = RenderOptions {
                depth_scale: scale,
                ..Default::default()
            };
            let out = renderer.render_with(&camera, &opts).unwrap();
            for y in 0..2 {
                for x in 0..2 {
                    assert_eq!(out.mask.get_pixel(x, y).0, [MASK_HIT]);
                    assert_eq!(out.depth.get_pixel(x, y).0, [scale as u16]);
                    assert_eq!(out.color.get_pixel(x, y).0, BACKGROUND);
                }
            }
            assert_eq!(out.visible_faces, vec![0, 1]);
        }
    }

    #[test]
    fn test_symmetric_quad_fills_2x2_view() {
        // Pixels (0, 0) and (1, 1) land exactly on the shared diagonal
        let renderer = prepared(TriangleMesh::quad([
            Point3::new(-1.0, -1.0, 1.0),
            Point3::new(-1.0, 1.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(1.0, -1.0, 1.0),
        ]));
        let camera =
            PinholeCamera::new(2, 2, Pose::identity(), Point2::new(0.5, 0.5), Vec2::new(1.0, 1.0))
                .unwrap();

        for scale in [1.0, 3.0, 7.3, 1000.0, 65535.0] {
            let opts = RenderOptions {
                depth_scale: scale,
                ..Default::default()
            };
            let out = renderer.render_with(&camera, &opts).unwrap();
            assert!(out.mask.pixels().all(|p| p.0 == [MASK_HIT]), "scale {scale}");
            assert!(
                out.depth.pixels().all(|p| p.0 == [scale as u16]),
                "scale {scale}: {:?}",
                out.depth.as_raw()
            );
            assert!(out.face_id.pixels().all(|p| p.0[0] < 2));
        }
    }

    #[test]
    fn test_backface_culling() {
        // Reverse winding so the triangle faces away from the camera
        let flipped = TriangleMesh::new(rgb_triangle().vertices().to_vec(), vec![[0, 2, 1]]);
        let renderer = prepared(flipped);
        let camera = axis_camera(Pose::identity());

        let culled = renderer.render_with(&camera, &RenderOptions::default()).unwrap();
        assert_eq!(culled.mask.get_pixel(0, 0).0, [0]);
        assert_eq!(culled.depth.get_pixel(0, 0).0, [0]);
        assert!(culled.visible_faces.is_empty());

        let opts = RenderOptions {
            backface_culling: false,
            ..Default::default()
        };
        let kept = renderer.render_with(&camera, &opts).unwrap();
        assert_eq!(kept.mask.get_pixel(0, 0).0, [MASK_HIT]);
        assert_eq!(kept.depth.get_pixel(0, 0).0, [2]);
    }

    #[test]
    fn test_bilinear_color_at_centroid() {
        let renderer = prepared(rgb_triangle());
        let opts = RenderOptions {
            use_vertex_color: true,
            ..Default::default()
        };
        let out = renderer.render_with(&axis_camera(Pose::identity()), &opts).unwrap();
        assert_eq!(out.color.get_pixel(0, 0).0, [85, 85, 85]);
    }

    #[test]
    fn test_nearest_color_is_pure() {
        let renderer = prepared(rgb_triangle());
        let opts = RenderOptions {
            use_vertex_color: true,
            interp: ColorInterpolation::Nearest,
            ..Default::default()
        };
        let out = renderer.render_with(&axis_camera(Pose::identity()), &opts).unwrap();
        let c = out.color.get_pixel(0, 0).0;
        assert!([RED, GREEN, BLUE].contains(&c), "blended color {c:?}");

        // Close to vertex 1
        let shifted = axis_camera(pose_from_tq([-0.8, 1.6, 0.0], [0.0, 0.0, 0.0, 1.0]));
        let out = renderer.render_with(&shifted, &opts).unwrap();
        assert_eq!(out.color.get_pixel(0, 0).0, GREEN);

        let opts = RenderOptions {
            interp: ColorInterpolation::Bilinear,
            ..opts
        };
        let out = renderer.render_with(&shifted, &opts).unwrap();
        assert_eq!(out.color.get_pixel(0, 0).0, [17, 221, 17]);
    }

    #[test]
    fn test_vertex_colors_off_or_missing() {
        let renderer = prepared(rgb_triangle());
        let out = renderer
            .render_with(&axis_camera(Pose::identity()), &RenderOptions::default())
            .unwrap();
        assert_eq!(out.mask.get_pixel(0, 0).0, [MASK_HIT]);
        assert_eq!(out.color.get_pixel(0, 0).0, BACKGROUND);

        let plain = TriangleMesh::new(rgb_triangle().vertices().to_vec(), vec![[0, 1, 2]]);
        let renderer = prepared(plain);
        let opts = RenderOptions {
            use_vertex_color: true,
            ..Default::default()
        };
        let out = renderer.render_with(&axis_camera(Pose::identity()), &opts).unwrap();
        assert_eq!(out.mask.get_pixel(0, 0).0, [MASK_HIT]);
        assert_eq!(out.color.get_pixel(0, 0).0, BACKGROUND);
    }

    #[test]
    fn test_ortho_cube() {
        let renderer = prepared(TriangleMesh::cube(3.0));
        let camera = OrthoCamera::new(4, 4, pose_from_tq([0.0, 0.0, -5.0], [0.0, 0.0, 0.0, 1.0])).unwrap();
        let opts = RenderOptions {
            depth_scale: 10.0,
            ..Default::default()
        };
        let out = renderer.render_with(&camera, &opts).unwrap();

        for y in 0..4 {
            for x in 0..4 {
                let inside = x > 0 && y > 0;
                let mask = out.mask.get_pixel(x, y).0[0];
                let depth = out.depth.get_pixel(x, y).0[0];
                if inside {
                    assert_eq!((mask, depth), (MASK_HIT, 35), "pixel ({x}, {y})");
                } else {
                    assert_eq!((mask, depth), (0, 0), "pixel ({x}, {y})");
                }
            }
        }
        // Only the two triangles of the -z side are visible
        assert_eq!(out.visible_faces, vec![0, 1]);
    }

    #[test]
    fn test_face_normals_and_ids() {
        let renderer = prepared(TriangleMesh::cube(3.0));
        let camera = OrthoCamera::new(4, 4, pose_from_tq([0.0, 0.0, -5.0], [0.0, 0.0, 0.0, 1.0])).unwrap();
        let opts = RenderOptions {
            shading_normal: ShadingNormal::Face,
            ..Default::default()
        };
        let out = renderer.render_with(&camera, &opts).unwrap();

        for (x, y, mask) in out.mask.enumerate_pixels() {
            let normal = out.normal.get_pixel(x, y).0;
            let id = out.face_id.get_pixel(x, y).0[0];
            if mask.0 == [MASK_HIT] {
                assert_eq!(normal, [0.0, 0.0, -1.0], "pixel ({x}, {y})");
                assert!(id == 0 || id == 1, "pixel ({x}, {y}) hit face {id}");
            } else {
                assert_eq!(normal, [0.0, 0.0, 0.0]);
                assert_eq!(id, NO_FACE);
            }
        }
    }

    #[test]
    fn test_normals_are_in_camera_frame() {
        let renderer = prepared(TriangleMesh::cube(1.0));
        // Looking at the +x face along -x
        let pose = look_at(&Point3::new(4.0, 0.0, 0.0), &Point3::origin(), &Vec3::y()).unwrap();
        let camera = PinholeCamera::with_fov_y(9, 9, pose, 30.0).unwrap();
        let opts = RenderOptions {
            shading_normal: ShadingNormal::Face,
            ..Default::default()
        };
        let out = renderer.render_with(&camera, &opts).unwrap();

        // Above the face's diagonal, which crosses the optical axis
        assert_eq!(out.mask.get_pixel(4, 3).0, [MASK_HIT]);
        let [nx, ny, nz] = out.normal.get_pixel(4, 3).0;
        assert_relative_eq!(nx, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ny, 0.0, epsilon = 1e-6);
        assert_relative_eq!(nz, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_interpolated_vertex_normals() {
        let mut cube = TriangleMesh::cube(3.0);
        cube.compute_vertex_normals();
        let corner_normals = cube.vertex_normals().unwrap().to_vec();
        let renderer = prepared(cube);
        let camera = OrthoCamera::new(4, 4, pose_from_tq([0.0, 0.0, -5.0], [0.0, 0.0, 0.0, 1.0])).unwrap();
        let out = renderer.render_with(&camera, &RenderOptions::default()).unwrap();

        for (x, y, mask) in out.mask.enumerate_pixels() {
            if mask.0 != [MASK_HIT] {
                continue;
            }
            let [nx, ny, nz] = out.normal.get_pixel(x, y).0;
            let len = (nx * nx + ny * ny + nz * nz).sqrt();
            assert_relative_eq!(len, 1.0, epsilon = 1e-5);
            assert!(nz < 0.0);
        }

        // Pixel (1, 1) hits (-1, -1, -1.5) on face [0, 2, 1] with weights
        // 2/3 for vertex 0 and 1/6 for vertices 1 and 2
        let [nx, ny, nz] = out.normal.get_pixel(1, 1).0;
        assert!(nx < 0.0 && ny < 0.0);
        let expected = (corner_normals[0] * (2.0 / 3.0)
            + corner_normals[1] / 6.0
            + corner_normals[2] / 6.0)
            .normalize();
        assert_relative_eq!(nx as f64, expected.x, epsilon = 1e-5);
        assert_relative_eq!(ny as f64, expected.y, epsilon = 1e-5);
        assert_relative_eq!(nz as f64, expected.z, epsilon = 1e-5);
    }

    #[test]
    fn test_vertex_normals_missing_fall_back_to_face() {
        let renderer = prepared(TriangleMesh::cube(3.0));
        let camera = OrthoCamera::new(4, 4, pose_from_tq([0.0, 0.0, -5.0], [0.0, 0.0, 0.0, 1.0])).unwrap();
        let vertex = renderer.render_with(&camera, &RenderOptions::default()).unwrap();
        let face = renderer
            .render_with(
                &camera,
                &RenderOptions {
                    shading_normal: ShadingNormal::Face,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(vertex.normal.as_raw(), face.normal.as_raw());
    }

    #[test]
    fn test_depth_is_camera_z_not_distance() {
        let renderer = prepared(TriangleMesh::quad([
            Point3::new(-10.0, -10.0, 4.0),
            Point3::new(-10.0, 10.0, 4.0),
            Point3::new(10.0, 10.0, 4.0),
            Point3::new(10.0, -10.0, 4.0),
        ]));
        // Wide view so corner rays travel much farther than 4
        let camera = PinholeCamera::with_fov_y(9, 9, Pose::identity(), 120.0).unwrap();
        let opts = RenderOptions {
            depth_scale: 100.0,
            ..Default::default()
        };
        let out = renderer.render_with(&camera, &opts).unwrap();
        assert!(out.depth.pixels().all(|d| d.0 == [400]));
    }

    #[test]
    fn test_depth_saturates() {
        let renderer = prepared(facing_quad());
        let camera = axis_camera(Pose::identity());
        let opts = RenderOptions {
            depth_scale: 1e6,
            ..Default::default()
        };
        let out = renderer.render_with(&camera, &opts).unwrap();
        assert_eq!(out.depth.get_pixel(0, 0).0, [u16::MAX]);
    }

    #[test]
    fn test_miss_everywhere() {
        let renderer = prepared(TriangleMesh::cube(1.0));
        let eye = Point3::new(0.0, 0.0, 5.0);
        let away = look_at(&eye, &Point3::new(0.0, 0.0, 10.0), &Vec3::y()).unwrap();
        let camera = PinholeCamera::with_fov_y(8, 6, away, 60.0).unwrap();
        let out = renderer.render_with(&camera, &RenderOptions::default()).unwrap();
        assert!(out.mask.pixels().all(|p| p.0 == [0]));
        assert!(out.depth.pixels().all(|p| p.0 == [0]));
        assert!(out.color.pixels().all(|p| p.0 == BACKGROUND));
        assert!(out.visible_faces.is_empty());
    }

    #[test]
    fn test_render_repeats_across_cameras_without_prepare() {
        let renderer = prepared(TriangleMesh::cube(1.0));
        for i in 0..4 {
            let a = i as f64 * std::f64::consts::FRAC_PI_2;
            let eye = Point3::new(3.0 * a.cos(), 0.5, 3.0 * a.sin());
            let pose = look_at(&eye, &Point3::origin(), &Vec3::y()).unwrap();
            let camera = PinholeCamera::with_fov_y(16, 16, pose, 45.0).unwrap();
            let out = renderer.render_with(&camera, &RenderOptions::default()).unwrap();
            assert_eq!(out.mask.get_pixel(8, 8).0, [MASK_HIT]);
        }
    }

    #[test]
    fn test_lifecycle_errors() {
        let mut renderer = Renderer::new();
        let camera = axis_camera(Pose::identity());
        assert_eq!(renderer.prepare().unwrap_err(), RenderError::MeshNotSet);
        assert_eq!(
            renderer.render_with(&camera, &RenderOptions::default()).unwrap_err(),
            RenderError::NotPrepared
        );

        renderer.set_mesh(Arc::new(TriangleMesh::default()));
        assert_eq!(renderer.prepare().unwrap_err(), RenderError::EmptyMesh);

        renderer.set_mesh(Arc::new(rgb_triangle()));
        assert!(!renderer.is_prepared());
        renderer.prepare().unwrap();
        assert_eq!(renderer.render().unwrap_err(), RenderError::CameraNotSet);

        renderer.set_camera(Arc::new(camera));
        assert!(renderer.render().is_ok());

        // A new mesh needs a new prepare
        renderer.set_mesh(Arc::new(facing_quad()));
        assert_eq!(renderer.render().unwrap_err(), RenderError::NotPrepared);

        renderer.set_options(RenderOptions {
            depth_scale: f64::NAN,
            ..Default::default()
        });
        renderer.prepare().unwrap();
        assert!(matches!(renderer.render(), Err(RenderError::InvalidOptions(_))));
    }

    #[test]
    fn test_invalid_mesh_rejected_at_prepare() {
        let mut renderer = Renderer::new();
        renderer.set_mesh(Arc::new(
            TriangleMesh::cube(1.0).with_vertex_colors(vec![RED; 3]),
        ));
        assert!(matches!(renderer.prepare(), Err(RenderError::InvalidMesh(_))));
        assert!(!renderer.is_prepared());
    }

    #[test]
    fn test_cancelled_render() {
        let mut renderer = prepared(TriangleMesh::cube(1.0));
        renderer.set_camera(Arc::new(axis_camera(Pose::identity())));

        let cancel = AtomicBool::new(true);
        assert_eq!(renderer.render_cancellable(&cancel).unwrap_err(), RenderError::Cancelled);

        cancel.store(false, Ordering::Relaxed);
        assert!(renderer.render_cancellable(&cancel).is_ok());
    }

    #[test]
    fn test_quantize_depth() {
        assert_eq!(quantize_depth(-3.0), 0);
        assert_eq!(quantize_depth(f64::NAN), 0);
        assert_eq!(quantize_depth(12.7), 12);
        assert_eq!(quantize_depth(0.999_999_999_9), 1);
        assert_eq!(quantize_depth(1e9), u16::MAX);
    }
}
