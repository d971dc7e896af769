//! Orthographic camera.

use raycam_math::{Point2, Point3, Pose, Vec3};

use crate::base::validate_size;
use crate::error::Result;
use crate::{Camera, Frame, RayTable};

/// Everything that defines an orthographic camera.
#[derive(Debug, Clone, PartialEq)]
pub struct OrthoParams {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Camera-to-world pose.
    pub c2w: Pose,
}

impl OrthoParams {
    /// Check the image size.
    pub fn validate(&self) -> Result<()> {
        validate_size(self.width, self.height)
    }
}

/// Orthographic camera with one world unit per pixel.
///
/// Image coordinates equal camera-space `x`/`y`, and each pixel's ray starts
/// on the image plane offset so the image center sits on the optical axis.
#[derive(Debug, Clone)]
pub struct OrthoCamera {
    params: OrthoParams,
    w2c: Pose,
    table: RayTable,
}

impl OrthoCamera {
    /// Create a camera.
    pub fn new(width: u32, height: u32, c2w: Pose) -> Result<Self> {
        Self::from_params(OrthoParams { width, height, c2w })
    }

    /// Create a camera from a full parameter set.
    pub fn from_params(params: OrthoParams) -> Result<Self> {
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
    pub fn params(&self) -> &OrthoParams {
        &self.params
    }

    /// Resize the image.
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

    /// Change any number of parameters with a single validation and a
    /// single table rebuild. On error the camera is unchanged.
    pub fn update<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut OrthoParams),
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

impl Camera for OrthoCamera {
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
        (Point2::new(camera_p.x, camera_p.y), camera_p.z)
    }

    fn unproject(&self, image_p: &Point2, depth: f64) -> Point3 {
        Point3::new(image_p.x, image_p.y, depth)
    }

    fn ray_origin(&self, x: f64, y: f64, frame: Frame) -> Point3 {
        let origin_c = Point3::new(
            x - self.params.width as f64 / 2.0,
            y - self.params.height as f64 / 2.0,
            0.0,
        );
        match frame {
            Frame::Camera => origin_c,
            Frame::World => self.params.c2w * origin_c,
        }
    }

    fn ray_direction(&self, _x: f64, _y: f64, frame: Frame) -> Vec3 {
        match frame {
            Frame::Camera => Vec3::z(),
            Frame::World => self.params.c2w.rotation * Vec3::z(),
        }
    }

    fn ray_table(&self) -> &RayTable {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CameraError;
    use approx::assert_relative_eq;
    use raycam_math::pose_from_tq;

    #[test]
    fn test_project_is_identity() {
        let cam = OrthoCamera::new(10, 10, Pose::identity()).unwrap();
        let p = Point3::new(2.5, -1.0, 7.0);
        let (image_p, d) = cam.project(&p);
        assert_eq!(image_p, Point2::new(2.5, -1.0));
        assert_eq!(d, 7.0);
        assert_eq!(cam.unproject(&image_p, d), p);
    }

    #[test]
    fn test_ray_origins_centered() {
        let cam = OrthoCamera::new(4, 2, Pose::identity()).unwrap();
        assert_eq!(cam.ray_origin_at(0, 0, Frame::Camera).unwrap(), Point3::new(-2.0, -1.0, 0.0));
        assert_eq!(cam.ray_origin_at(3, 1, Frame::Camera).unwrap(), Point3::new(1.0, 0.0, 0.0));
        // Odd sizes keep the fractional offset
        let cam = OrthoCamera::new(3, 3, Pose::identity()).unwrap();
        assert_eq!(cam.ray_origin_at(1, 1, Frame::Camera).unwrap(), Point3::new(-0.5, -0.5, 0.0));
    }

    #[test]
    fn test_world_rays_are_parallel() {
        let pose = pose_from_tq([1.0, 2.0, 3.0], [0.2, -0.4, 0.1, 0.8]);
        let cam = OrthoCamera::new(5, 4, pose).unwrap();
        let forward = pose.rotation * Vec3::z();
        for y in 0..4 {
            for x in 0..5 {
                let dir = cam.ray_direction_at(x, y, Frame::World).unwrap();
                assert_relative_eq!(dir, forward, epsilon = 1e-15);
                let origin_c = cam.ray_origin_at(x, y, Frame::Camera).unwrap();
                let origin_w = cam.ray_origin_at(x, y, Frame::World).unwrap();
                assert_relative_eq!(origin_w, pose * origin_c, epsilon = 1e-12);
            }
        }
    }

    fn assert_tables_match(cam: &OrthoCamera) {
        let (w, h) = (cam.width(), cam.height());
        assert_eq!(cam.ray_table().origins(Frame::Camera).len(), (w * h) as usize);
        assert_eq!(cam.ray_table().directions(Frame::World).len(), (w * h) as usize);
        for y in 0..h {
            for x in 0..w {
                for frame in [Frame::Camera, Frame::World] {
                    let direct = cam.ray_direction(x as f64, y as f64, frame);
                    let cached = cam.ray_direction_at(x, y, frame).unwrap();
                    assert_relative_eq!(direct, cached, epsilon = 1e-15);
                    let direct = cam.ray_origin(x as f64, y as f64, frame);
                    let cached = cam.ray_origin_at(x, y, frame).unwrap();
                    assert_relative_eq!(direct, cached, epsilon = 1e-15);
                }
            }
        }
        assert!(cam.ray_origin_at(w, 0, Frame::Camera).is_none());
        assert!(cam.ray_direction_at(0, h, Frame::World).is_none());
    }

    #[test]
    fn test_tables_follow_mutations() {
        let mut cam = OrthoCamera::new(2, 2, Pose::identity()).unwrap();
        assert_tables_match(&cam);

        cam.set_size(6, 3).unwrap();
        assert_tables_match(&cam);
        assert_eq!(cam.ray_origin_at(5, 2, Frame::Camera).unwrap(), Point3::new(2.0, 0.5, 0.0));

        let pose = pose_from_tq([0.0, 0.0, 10.0], [0.0, 0.0, 0.0, 1.0]);
        cam.set_c2w(pose);
        assert_tables_match(&cam);
        assert_eq!(cam.ray_origin_at(0, 0, Frame::World).unwrap(), Point3::new(-3.0, -1.5, 10.0));

        let tilted = pose_from_tq([1.0, -2.0, 0.5], [0.3, 0.1, -0.2, 0.9]);
        cam.update(|params| {
            params.width = 5;
            params.height = 7;
            params.c2w = tilted;
        })
        .unwrap();
        assert_tables_match(&cam);
        assert_relative_eq!(
            cam.ray_direction_at(4, 6, Frame::World).unwrap(),
            tilted.rotation * Vec3::z(),
            epsilon = 1e-15
        );

        // A rejected change leaves consistent tables behind
        assert!(cam.set_size(0, 4).is_err());
        assert_tables_match(&cam);
    }

    #[test]
    fn test_invalid_size_rejected() {
        let mut cam = OrthoCamera::new(2, 2, Pose::identity()).unwrap();
        assert_eq!(
            cam.set_size(2, 0).unwrap_err(),
            CameraError::InvalidSize { width: 2, height: 0 }
        );
        assert_eq!(cam.width(), 2);
        assert_eq!(cam.height(), 2);
        assert!(OrthoCamera::new(0, 0, Pose::identity()).is_err());
    }
}
