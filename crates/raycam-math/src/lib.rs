#![warn(missing_docs)]

//! Math types for the raycam renderer.
//!
//! Thin aliases over nalgebra plus the few rigid-transform helpers the
//! camera and render crates share. All geometry is `f64`.
//!
//! Camera frames follow the computer vision convention: right-handed,
//! x right, y down, z forward.

use nalgebra::{Isometry3, Matrix3, Rotation3, Translation3, Unit, UnitQuaternion, Vector2, Vector3};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A point on the image plane, in pixels.
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in 2D space.
pub type Vec2 = Vector2<f64>;

/// A unit quaternion rotation.
pub type Quat = UnitQuaternion<f64>;

/// A rigid transform (rotation + translation).
///
/// Used for camera poses: `c2w` maps camera coordinates to world coordinates,
/// and its inverse `w2c` maps back. Because it is an isometry, the inverse is
/// exact.
pub type Pose = Isometry3<f64>;

/// Build a pose from a translation and a rotation.
pub fn pose_from_parts(translation: Vec3, rotation: Quat) -> Pose {
    Isometry3::from_parts(Translation3::from(translation), rotation)
}

/// Build a pose from a translation and a quaternion given as `(x, y, z, w)`.
///
/// The quaternion is normalized; trajectory files are not trusted to store
/// exactly unit quaternions.
pub fn pose_from_tq(t: [f64; 3], q: [f64; 4]) -> Pose {
    let quat = nalgebra::Quaternion::new(q[3], q[0], q[1], q[2]);
    pose_from_parts(Vec3::new(t[0], t[1], t[2]), UnitQuaternion::from_quaternion(quat))
}

/// The x, y and z axes of a pose's rotation, expressed in the parent frame.
///
/// For a camera-to-world pose these are the camera's right, down and
/// forward directions in world space.
pub fn pose_axes(pose: &Pose) -> [Vec3; 3] {
    let r = pose.rotation.to_rotation_matrix();
    let m = r.matrix();
    [
        m.column(0).into_owned(),
        m.column(1).into_owned(),
        m.column(2).into_owned(),
    ]
}

/// Camera-to-world pose of a camera at `eye` looking at `target`.
///
/// `up` is the world direction that should appear upward in the image; the
/// camera's y axis points the opposite way. Returns `None` when `eye` and
/// `target` coincide or the view direction is parallel to `up`.
pub fn look_at(eye: &Point3, target: &Point3, up: &Vec3) -> Option<Pose> {
    let forward = (target - eye).try_normalize(1e-12)?;
    let right = forward.cross(up).try_normalize(1e-12)?;
    let down = forward.cross(&right);

    let rot = Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[right, down, forward]));
    Some(pose_from_parts(eye.coords, UnitQuaternion::from_rotation_matrix(&rot)))
}
