//! Camera poses circling a mesh.

use std::f64::consts::TAU;

use raycam_math::{look_at, Pose, Vec3};
use raycam_render::MeshStats;

/// Distance from the mesh center, as a multiple of the largest bounding box
/// edge.
pub const ORBIT_DISTANCE_FACTOR: f64 = 1.5;

/// `count` poses evenly spaced on a horizontal circle around the mesh, all
/// looking at its center with world +y up.
///
/// The first pose sits on the -z side of the mesh looking toward +z.
pub fn orbit_poses(stats: &MeshStats, count: usize) -> Vec<Pose> {
    let extent = stats.bb_max - stats.bb_min;
    let mut radius = extent.max() * ORBIT_DISTANCE_FACTOR;
    if radius <= 0.0 {
        radius = 1.0;
    }
    let center = stats.center;

    (0..count)
        .filter_map(|i| {
            let angle = TAU * i as f64 / count as f64;
            let eye = center + Vec3::new(radius * angle.sin(), 0.0, -radius * angle.cos());
            look_at(&eye, &center, &Vec3::y())
        })
        .collect()
}
