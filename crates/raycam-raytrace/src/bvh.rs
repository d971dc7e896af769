//! Bounding Volume Hierarchy for accelerated ray-triangle queries.
//!
//! Uses Surface Area Heuristic (SAH) for construction. The tree is immutable
//! once built, so queries are safe from any number of threads.

use raycam_math::Point3;

use crate::error::{BvhError, Result};
use crate::triangle::intersect_triangle;
use crate::{Aabb3, Ray, TriangleHit};

/// Maximum number of triangles stored in a leaf.
const MAX_LEAF_TRIANGLES: usize = 4;

/// Number of SAH buckets per axis.
const NUM_BUCKETS: usize = 12;

/// A BVH node - either a leaf containing triangles or an internal node with children.
#[derive(Debug, Clone)]
pub(crate) enum BvhNode {
    /// Leaf node containing triangle indices.
    Leaf {
        /// Axis-aligned bounding box of this node.
        aabb: Aabb3,
        /// Triangle indices contained in this leaf.
        triangles: Vec<u32>,
    },
    /// Internal node with two children.
    Internal {
        /// Axis-aligned bounding box of this node.
        aabb: Aabb3,
        /// Left child node.
        left: Box<BvhNode>,
        /// Right child node.
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    fn aabb(&self) -> &Aabb3 {
        match self {
            BvhNode::Leaf { aabb, .. } => aabb,
            BvhNode::Internal { aabb, .. } => aabb,
        }
    }
}

/// Shape statistics of a built BVH.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhStats {
    /// Number of triangles indexed.
    pub num_triangles: usize,
    /// Number of leaf nodes.
    pub num_leaf_nodes: usize,
    /// Number of internal (branch) nodes.
    pub num_branch_nodes: usize,
    /// Depth of the deepest leaf (root = 0).
    pub max_depth: usize,
    /// Bounds of the whole mesh.
    pub bounds: Aabb3,
}

/// Bounding Volume Hierarchy over an indexed triangle mesh.
#[derive(Debug, Clone)]
pub struct Bvh {
    root: BvhNode,
    positions: Vec<Point3>,
    triangles: Vec<[u32; 3]>,
}

/// Per-triangle build record: (triangle index, bounds, centroid).
type TriangleRecord = (u32, Aabb3, Point3);

impl Bvh {
    /// Build a BVH from flattened buffers using SAH construction.
    ///
    /// `vertices` holds `x, y, z` per vertex; `indices` holds three vertex
    /// indices per triangle.
    pub fn build(vertices: &[f64], indices: &[u32]) -> Result<Self> {
        if vertices.is_empty() || indices.is_empty() {
            return Err(BvhError::EmptyMesh);
        }
        if !vertices.len().is_multiple_of(3) {
            return Err(BvhError::InvalidIndexBuffer(format!(
                "vertex buffer length {} is not a multiple of 3",
                vertices.len()
            )));
        }
        if !indices.len().is_multiple_of(3) {
            return Err(BvhError::InvalidIndexBuffer(format!(
                "index buffer length {} is not a multiple of 3",
                indices.len()
            )));
        }

        let positions: Vec<Point3> = vertices
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();

        let mut triangles = Vec::with_capacity(indices.len() / 3);
        for (face, chunk) in indices.chunks_exact(3).enumerate() {
            if let Some(&bad) = chunk.iter().find(|&&i| i as usize >= positions.len()) {
                return Err(BvhError::InvalidIndexBuffer(format!(
                    "triangle {face} references vertex {bad}, but there are only {} vertices",
                    positions.len()
                )));
            }
            triangles.push([chunk[0], chunk[1], chunk[2]]);
        }

        // Collect all triangles with their AABBs
        let mut records: Vec<TriangleRecord> = triangles
            .iter()
            .enumerate()
            .map(|(i, tri)| {
                let aabb = Aabb3::from_points(tri.iter().map(|&v| &positions[v as usize]));
                (i as u32, aabb, aabb.center())
            })
            .collect();

        let root = build_node(&mut records);

        Ok(Self {
            root,
            positions,
            triangles,
        })
    }

    /// Trace a ray and return only the closest hit.
    pub fn trace_closest(&self, ray: &Ray) -> Option<TriangleHit> {
        let mut closest: Option<TriangleHit> = None;
        let mut closest_t = ray.t_max;

        self.trace_node_closest(ray, &self.root, &mut closest, &mut closest_t);

        closest
    }

    /// Trace a ray, keeping only the closest hit.
    fn trace_node_closest(
        &self,
        ray: &Ray,
        node: &BvhNode,
        closest: &mut Option<TriangleHit>,
        closest_t: &mut f64,
    ) {
        match node {
            BvhNode::Leaf { aabb, triangles } => {
                if let Some((t_min, _)) = ray.intersect_aabb(aabb) {
                    // Early out if AABB entry is beyond current closest
                    if t_min > *closest_t {
                        return;
                    }

                    for &face_id in triangles {
                        if let Some(hit) = self.test_triangle(ray, face_id) {
                            if hit.t < *closest_t {
                                *closest_t = hit.t;
                                *closest = Some(hit);
                            }
                        }
                    }
                }
            }
            BvhNode::Internal { aabb, left, right } => {
                if let Some((t_min, _)) = ray.intersect_aabb(aabb) {
                    if t_min > *closest_t {
                        return;
                    }

                    // Test children in order of AABB distance
                    let left_t = ray.intersect_aabb(left.aabb()).map(|(t, _)| t);
                    let right_t = ray.intersect_aabb(right.aabb()).map(|(t, _)| t);

                    match (left_t, right_t) {
                        (Some(lt), Some(rt)) => {
                            if lt < rt {
                                self.trace_node_closest(ray, left, closest, closest_t);
                                self.trace_node_closest(ray, right, closest, closest_t);
                            } else {
                                self.trace_node_closest(ray, right, closest, closest_t);
                                self.trace_node_closest(ray, left, closest, closest_t);
                            }
                        }
                        (Some(_), None) => {
                            self.trace_node_closest(ray, left, closest, closest_t);
                        }
                        (None, Some(_)) => {
                            self.trace_node_closest(ray, right, closest, closest_t);
                        }
                        (None, None) => {}
                    }
                }
            }
        }
    }

    /// Test a ray against a single triangle.
    fn test_triangle(&self, ray: &Ray, face_id: u32) -> Option<TriangleHit> {
        let [a, b, c] = self.triangles[face_id as usize];
        let (t, u, v) = intersect_triangle(
            ray,
            &self.positions[a as usize],
            &self.positions[b as usize],
            &self.positions[c as usize],
        )?;
        Some(TriangleHit { face_id, u, v, t })
    }

    /// Count nodes and measure depth.
    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats {
            num_triangles: self.triangles.len(),
            num_leaf_nodes: 0,
            num_branch_nodes: 0,
            max_depth: 0,
            bounds: *self.root.aabb(),
        };
        collect_stats(&self.root, 0, &mut stats);
        stats
    }
}

fn collect_stats(node: &BvhNode, depth: usize, stats: &mut BvhStats) {
    match node {
        BvhNode::Leaf { .. } => {
            stats.num_leaf_nodes += 1;
            stats.max_depth = stats.max_depth.max(depth);
        }
        BvhNode::Internal { left, right, .. } => {
            stats.num_branch_nodes += 1;
            collect_stats(left, depth + 1, stats);
            collect_stats(right, depth + 1, stats);
        }
    }
}

/// Build a BVH node recursively using SAH.
fn build_node(records: &mut [TriangleRecord]) -> BvhNode {
    // Compute bounds of all triangles
    let mut bounds = Aabb3::empty();
    for (_, aabb, _) in records.iter() {
        bounds.include_aabb(aabb);
    }

    // Base case: small number of triangles -> leaf
    if records.len() <= MAX_LEAF_TRIANGLES {
        return BvhNode::Leaf {
            aabb: bounds,
            triangles: records.iter().map(|(id, _, _)| *id).collect(),
        };
    }

    let mid = match find_best_split(records, &bounds) {
        Some((axis, pos)) => partition(records, axis, pos),
        None => 0,
    };

    // Fall back to a median split when SAH finds nothing useful
    let mid = if mid == 0 || mid == records.len() {
        records.len() / 2
    } else {
        mid
    };

    let (left_data, right_data) = records.split_at_mut(mid);

    BvhNode::Internal {
        aabb: bounds,
        left: Box::new(build_node(left_data)),
        right: Box::new(build_node(right_data)),
    }
}

/// Find the best split axis and position using SAH.
fn find_best_split(records: &[TriangleRecord], bounds: &Aabb3) -> Option<(usize, f64)> {
    let extent = bounds.extent();
    let total_area = bounds.surface_area();

    let mut best_cost = f64::INFINITY;
    let mut best = None;

    for axis in 0..3 {
        let axis_extent = extent[axis];
        if axis_extent < 1e-10 {
            continue;
        }
        let axis_min = bounds.min[axis];

        let mut bucket_counts = [0usize; NUM_BUCKETS];
        let mut bucket_bounds = [Aabb3::empty(); NUM_BUCKETS];

        for (_, aabb, centroid) in records {
            let b = ((centroid[axis] - axis_min) / axis_extent * NUM_BUCKETS as f64) as usize;
            let b = b.min(NUM_BUCKETS - 1);
            bucket_counts[b] += 1;
            bucket_bounds[b].include_aabb(aabb);
        }

        // Sweep to find best split
        for split in 1..NUM_BUCKETS {
            let mut left_count = 0;
            let mut left_bounds = Aabb3::empty();
            for i in 0..split {
                if bucket_counts[i] > 0 {
                    left_count += bucket_counts[i];
                    left_bounds.include_aabb(&bucket_bounds[i]);
                }
            }

            let mut right_count = 0;
            let mut right_bounds = Aabb3::empty();
            for i in split..NUM_BUCKETS {
                if bucket_counts[i] > 0 {
                    right_count += bucket_counts[i];
                    right_bounds.include_aabb(&bucket_bounds[i]);
                }
            }

            if left_count == 0 || right_count == 0 {
                continue;
            }

            // SAH cost: traversal + P(left) * N_left + P(right) * N_right
            let cost = 0.125
                + left_bounds.surface_area() / total_area * left_count as f64
                + right_bounds.surface_area() / total_area * right_count as f64;

            if cost < best_cost {
                best_cost = cost;
                best = Some((axis, axis_min + (split as f64 / NUM_BUCKETS as f64) * axis_extent));
            }
        }
    }

    best
}

/// Partition triangles by centroid along an axis; returns the split index.
fn partition(records: &mut [TriangleRecord], axis: usize, pos: f64) -> usize {
    let mut left = 0;
    let mut right = records.len();

    while left < right {
        if records[left].2[axis] < pos {
            left += 1;
        } else {
            right -= 1;
            records.swap(left, right);
        }
    }

    left
}
