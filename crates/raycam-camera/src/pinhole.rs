//! Perspective (pinhole) camera.

use raycam_math::{Point2, Point3, Pose, Vec2, Vec3};

use crate::base::{focal_from_fov, fov_from_focal, validate_size};
use crate::error::{CameraError, Result};
use crate::{Camera, Frame, RayTable};

/// Everything that defines a pinhole camera.
///
/// Focal length and principal point are in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PinholeParams {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Camera-to-world pose.
    pub c2w: Pose,
    /// Principal point `(px, py)`.
    pub principal_point: Point2,
    /// Focal length `(fx, fy)`.
    pub focal_length: Vec2,
}

impl PinholeParams {
    /// Check size and intrinsics.
    pub fn validate(&self) -> Result<()> {
        validate_size(self.width, self.height)?;
        validate_focal_length(&self.focal_length)?;
        validate_principal_point(&self.principal_point)
    }
}

fn validate_focal_length(f: &Vec2) -> Result<()> {
    if !(f.x.is_finite() && f.y.is_finite() && f.x > 0.0 && f.y > 0.0) {
        return Err(CameraError::InvalidIntrinsics(format!(
            "focal length must be positive and finite, got ({}, {})",
            f.x, f.y
        )));
    }
    Ok(())
}

fn validate_principal_point(p: &Point2) -> Result<()> {
    if !(p.x.is_finite() && p.y.is_finite()) {
        return Err(CameraError::InvalidIntrinsics(format!(
            "principal point must be finite, got ({}, {})",
            p.x, p.y
        )));
    }
    Ok(())
}

/// Pinhole camera with pixel-scale principal point and focal length.
///
/// The usual perspective model in computer vision. Only meaningful for
/// fields of view well below 180 degrees.
#[derive(Debug, Clone)]
pub struct PinholeCamera {
    params: PinholeParams,
    w2c: Pose,
    table: RayTable,
}

impl PinholeCamera {
    /// Create a camera from explicit intrinsics.
    pub fn new(
        width: u32,
        height: u32,
        c2w: Pose,
        principal_point: Point2,
        focal_length: Vec2,
    ) -> Result<Self> {
        Self::from_params(PinholeParams {
            width,
            height,
            c2w,
            principal_point,
            focal_length,
        })
    }

    /// Create a camera with the principal point at the image center and
    /// square pixels giving `fov_y_deg` vertically.
    pub fn with_fov_y(width: u32, height: u32, c2w: Pose, fov_y_deg: f64) -> Result<Self> {
        validate_size(width, height)?;
        let f = focal_from_fov(height, fov_y_deg)?;
        Self::new(
            width,
            height,
            c2w,
            Point2::new(width as f64 * 0.5 - 0.5, height as f64 * 0.5 - 0.5),
            Vec2::new(f, f),
        )
    }

    /// Create a camera from a full parameter set.
    pub fn from_params(params: PinholeParams) -> Result<Self> {
        params.validate()?;
        let mut camera = Self {
            w2c: params.c2w.inverse(),
            params,
            table: RayTable::default(),
        };
        camera.rebuild();
        Ok(camera)
    }

    /// Current parameters.
    pub fn params(&self) -> &PinholeParams {
        &self.params
    }

    /// Principal point `(px, py)` in pixels.
    pub fn principal_point(&self) -> &Point2 {
        &self.params.principal_point
    }

    /// Focal length `(fx, fy)` in pixels.
    pub fn focal_length(&self) -> &Vec2 {
        &self.params.focal_length
    }

    /// Horizontal field of view in degrees.
    pub fn fov_x(&self) -> f64 {
        fov_from_focal(self.params.width, self.params.focal_length.x)
    }

    /// Vertical field of view in degrees.
    pub fn fov_y(&self) -> f64 {
        fov_from_focal(self.params.height, self.params.focal_length.y)
    }

    /// Resize the image. Intrinsics are kept as they are.
    pub fn set_size(&mut self, width: u32, height: u32) -> Result<()> {
        self.update(|p| {
            p.width = width;
            p.height = height;
        })
    }

    /// Move the camera.
    pub fn set_c2w(&mut self, c2w: Pose) {
        self.params.c2w = c2w;
        self.w2c = c2w.inverse();
        self.rebuild();
    }

    /// Set the principal point in pixels.
    pub fn set_principal_point(&mut self, principal_point: Point2) -> Result<()> {
        self.update(|p| p.principal_point = principal_point)
    }

    /// Set the focal length in pixels.
    pub fn set_focal_length(&mut self, focal_length: Vec2) -> Result<()> {
        self.update(|p| p.focal_length = focal_length)
    }

    /// Set the horizontal field of view in degrees.
    ///
    /// Sets **both** `fx` and `fy` to the derived focal length, so pixels stay
    /// square and the vertical field of view follows from the aspect ratio.
    /// Horizontal and vertical FOV cannot be chosen independently here; use
    /// [`PinholeCamera::set_focal_length`] for that.
    pub fn set_fov_x(&mut self, fov_x_deg: f64) -> Result<()> {
        let f = focal_from_fov(self.params.width, fov_x_deg)?;
        self.set_focal_length(Vec2::new(f, f))
    }

    /// Set the vertical field of view in degrees.
    ///
    /// Like [`PinholeCamera::set_fov_x`], this sets both `fx` and `fy`.
    pub fn set_fov_y(&mut self, fov_y_deg: f64) -> Result<()> {
        let f = focal_from_fov(self.params.height, fov_y_deg)?;
        self.set_focal_length(Vec2::new(f, f))
    }

    /// Change any number of parameters with a single validation and a
    /// single table rebuild.
    ///
    /// On error the camera is unchanged.
    pub fn update<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut PinholeParams),
    {
        let mut params = self.params.clone();
        f(&mut params);
        params.validate()?;
        self.w2c = params.c2w.inverse();
        self.params = params;
        self.rebuild();
        Ok(())
    }

    fn rebuild(&mut self) {
        let table = RayTable::build(
            self.params.width,
            self.params.height,
            |x, y, frame| self.ray_origin(x, y, frame),
            |x, y, frame| self.ray_direction(x, y, frame),
        );
        self.table = table;
    }
}

impl Camera for PinholeCamera {
    fn width(&self) -> u32 {
        self.params.width
    }

    fn height(&self) -> u32 {
        self.params.height
    }

    fn c2w(&self) -> &Pose {
        &self.params.c2w
    }

    fn w2c(&self) -> &Pose {
        &self.w2c
    }

    fn project(&self, camera_p: &Point3) -> (Point2, f64) {
        let f = &self.params.focal_length;
        let c = &self.params.principal_point;
        let image_p = Point2::new(
            f.x / camera_p.z * camera_p.x + c.x,
            f.y / camera_p.z * camera_p.y + c.y,
        );
        (image_p, camera_p.z)
    }

    fn unproject(&self, image_p: &Point2, depth: f64) -> Point3 {
        let f = &self.params.focal_length;
        let c = &self.params.principal_point;
        Point3::new(
            (image_p.x - c.x) * depth / f.x,
            (image_p.y - c.y) * depth / f.y,
            depth,
        )
    }

    fn ray_origin(&self, _x: f64, _y: f64, frame: Frame) -> Point3 {
        match frame {
            Frame::Camera => Point3::origin(),
            Frame::World => Point3::from(self.params.c2w.translation.vector),
        }
    }

    fn ray_direction(&self, x: f64, y: f64, frame: Frame) -> Vec3 {
        let f = &self.params.focal_length;
        let c = &self.params.principal_point;
        let dir = Vec3::new((x - c.x) / f.x, (y - c.y) / f.y, 1.0).normalize();
        match frame {
            Frame::Camera => dir,
            Frame::World => self.params.c2w.rotation * dir,
        }
    }

    fn ray_table(&self) -> &RayTable {
        &self.table
    }
}
