//! Per-pixel ray caches.

use raycam_math::{Point3, Vec3};

use crate::Frame;

/// Precomputed ray origins and directions for every integer pixel.
///
/// Stored row-major: pixel `(x, y)` lives at index `y * width + x`.
#[derive(Debug, Clone, Default)]
pub struct RayTable {
    width: u32,
    height: u32,
    origins_c: Vec<Point3>,
    origins_w: Vec<Point3>,
    directions_c: Vec<Vec3>,
    directions_w: Vec<Vec3>,
}

impl RayTable {
    /// Fill all four tables by evaluating the continuous ray functions at
    /// every integer pixel.
    pub(crate) fn build<O, D>(width: u32, height: u32, origin: O, direction: D) -> Self
    where
        O: Fn(f64, f64, Frame) -> Point3,
        D: Fn(f64, f64, Frame) -> Vec3,
    {
        let len = width as usize * height as usize;
        let mut table = Self {
            width,
            height,
            origins_c: Vec::with_capacity(len),
            origins_w: Vec::with_capacity(len),
            directions_c: Vec::with_capacity(len),
            directions_w: Vec::with_capacity(len),
        };

        for y in 0..height {
            for x in 0..width {
                let (fx, fy) = (x as f64, y as f64);
                table.origins_c.push(origin(fx, fy, Frame::Camera));
                table.origins_w.push(origin(fx, fy, Frame::World));
                table.directions_c.push(direction(fx, fy, Frame::Camera));
                table.directions_w.push(direction(fx, fy, Frame::World));
            }
        }

        log::trace!("rebuilt {width}x{height} ray tables");
        table
    }

    /// Table width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Table height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }

    /// Ray origin at pixel `(x, y)`.
    #[inline]
    pub fn origin(&self, x: u32, y: u32, frame: Frame) -> Option<Point3> {
        let i = self.index(x, y)?;
        Some(match frame {
            Frame::Camera => self.origins_c[i],
            Frame::World => self.origins_w[i],
        })
    }

    /// Unit ray direction at pixel `(x, y)`.
    #[inline]
    pub fn direction(&self, x: u32, y: u32, frame: Frame) -> Option<Vec3> {
        let i = self.index(x, y)?;
        Some(match frame {
            Frame::Camera => self.directions_c[i],
            Frame::World => self.directions_w[i],
        })
    }

    /// All origins in `frame`, row-major.
    pub fn origins(&self, frame: Frame) -> &[Point3] {
        match frame {
            Frame::Camera => &self.origins_c,
            Frame::World => &self.origins_w,
        }
    }

    /// All directions in `frame`, row-major.
    pub fn directions(&self, frame: Frame) -> &[Vec3] {
        match frame {
            Frame::Camera => &self.directions_c,
            Frame::World => &self.directions_w,
        }
    }
}
