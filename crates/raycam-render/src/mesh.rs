//! Triangle meshes as the renderer sees them.

use raycam_math::{Point3, Pose, Vec3};
use raycam_raytrace::triangle::triangle_normal;
use raycam_raytrace::Aabb3;

use crate::error::{RenderError, Result};

/// Read-only view of a triangle mesh.
///
/// Implementations must not change their contents between
/// [`Renderer::prepare`](crate::Renderer::prepare) and the last render that
/// uses them.
pub trait MeshView: Send + Sync {
    /// Vertex positions.
    fn vertices(&self) -> &[Point3];

    /// Triangles as vertex index triples.
    fn faces(&self) -> &[[u32; 3]];

    /// Per-vertex RGB colors, if the mesh has them.
    fn vertex_colors(&self) -> Option<&[[u8; 3]]> {
        None
    }

    /// Per-vertex normals, if the mesh has them.
    fn vertex_normals(&self) -> Option<&[Vec3]> {
        None
    }
}

/// Bounding box and center of a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshStats {
    /// Minimum corner of the bounding box.
    pub bb_min: Point3,
    /// Maximum corner of the bounding box.
    pub bb_max: Point3,
    /// Mean of all vertex positions.
    pub center: Point3,
}

/// An owned triangle mesh.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    vertices: Vec<Point3>,
    faces: Vec<[u32; 3]>,
    colors: Option<Vec<[u8; 3]>>,
    normals: Option<Vec<Vec3>>,
}

impl TriangleMesh {
    /// Create a mesh from positions and faces.
    pub fn new(vertices: Vec<Point3>, faces: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            faces,
            colors: None,
            normals: None,
        }
    }

    /// Attach per-vertex colors.
    pub fn with_vertex_colors(mut self, colors: Vec<[u8; 3]>) -> Self {
        self.colors = Some(colors);
        self
    }

    /// Attach per-vertex normals.
    pub fn with_vertex_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.faces.len()
    }

    /// Unnormalized normal of face `face_id`: `(v1 - v0) x (v2 - v0)`.
    ///
    /// Its length is twice the triangle area. Returns `None` for an unknown
    /// face or out-of-range vertex index.
    pub fn face_normal(&self, face_id: usize) -> Option<Vec3> {
        let [a, b, c] = self.faces.get(face_id)?;
        let v0 = self.vertices.get(*a as usize)?;
        let v1 = self.vertices.get(*b as usize)?;
        let v2 = self.vertices.get(*c as usize)?;
        Some(triangle_normal(v0, v1, v2))
    }

    /// Replace the vertex normals with area-weighted averages of the
    /// normals of adjacent faces.
    ///
    /// Vertices touched by no face, or only by degenerate faces, get a zero
    /// normal.
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Vec3::zeros(); self.vertices.len()];
        for face_id in 0..self.faces.len() {
            let Some(n) = self.face_normal(face_id) else {
                continue;
            };
            for &v in &self.faces[face_id] {
                normals[v as usize] += n;
            }
        }
        for n in &mut normals {
            *n = n.try_normalize(1e-12).unwrap_or_else(Vec3::zeros);
        }
        self.normals = Some(normals);
    }

    /// Bounding box and vertex centroid, or `None` for a mesh without
    /// vertices.
    pub fn stats(&self) -> Option<MeshStats> {
        if self.vertices.is_empty() {
            return None;
        }
        let bounds = Aabb3::from_points(&self.vertices);
        let sum = self
            .vertices
            .iter()
            .fold(Vec3::zeros(), |acc, p| acc + p.coords);
        Some(MeshStats {
            bb_min: bounds.min,
            bb_max: bounds.max,
            center: Point3::from(sum / self.vertices.len() as f64),
        })
    }

    /// Apply a rigid transform to positions and normals.
    pub fn transform(&mut self, pose: &Pose) {
        for p in &mut self.vertices {
            *p = pose * *p;
        }
        if let Some(normals) = &mut self.normals {
            for n in normals {
                *n = pose.rotation * *n;
            }
        }
    }

    /// Check that every face index and attribute array fits the vertex list.
    pub fn validate(&self) -> Result<()> {
        validate_mesh(self)
    }

    /// Two-triangle quad over `corners`, split along the `0-2` diagonal.
    ///
    /// Corners go around the quad in order; faces are `[0, 1, 2]` and
    /// `[0, 2, 3]`. The front side is the one [`TriangleMesh::face_normal`]
    /// points toward.
    pub fn quad(corners: [Point3; 4]) -> Self {
        Self::new(corners.to_vec(), vec![[0, 1, 2], [0, 2, 3]])
    }

    /// Axis-aligned cube centered at the origin with outward-facing
    /// triangles.
    pub fn cube(size: f64) -> Self {
        let h = size * 0.5;
        // Vertex i has x, y, z positive when bit 0, 1, 2 is set
        let vertices = (0..8u32)
            .map(|i| {
                let s = |bit: u32| if i & bit != 0 { h } else { -h };
                Point3::new(s(1), s(2), s(4))
            })
            .collect();
        let faces = vec![
            [0, 2, 1],
            [1, 2, 3],
            [4, 5, 6],
            [5, 7, 6],
            [0, 4, 2],
            [2, 4, 6],
            [1, 3, 5],
            [3, 7, 5],
            [0, 1, 4],
            [1, 5, 4],
            [2, 6, 3],
            [3, 6, 7],
        ];
        Self::new(vertices, faces)
    }
}

impl MeshView for TriangleMesh {
    fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    fn vertex_colors(&self) -> Option<&[[u8; 3]]> {
        self.colors.as_deref()
    }

    fn vertex_normals(&self) -> Option<&[Vec3]> {
        self.normals.as_deref()
    }
}

/// Structural checks shared by [`TriangleMesh::validate`] and the renderer.
pub(crate) fn validate_mesh(mesh: &dyn MeshView) -> Result<()> {
    let num_vertices = mesh.vertices().len();
    if num_vertices == 0 || mesh.faces().is_empty() {
        return Err(RenderError::EmptyMesh);
    }

    for (face_id, face) in mesh.faces().iter().enumerate() {
        if let Some(&bad) = face.iter().find(|&&i| i as usize >= num_vertices) {
            return Err(RenderError::InvalidMesh(format!(
                "face {face_id} references vertex {bad}, but there are only {num_vertices} vertices"
            )));
        }
    }

    if let Some(colors) = mesh.vertex_colors() {
        if colors.len() != num_vertices {
            return Err(RenderError::InvalidMesh(format!(
                "{} vertex colors for {num_vertices} vertices",
                colors.len()
            )));
        }
    }
    if let Some(normals) = mesh.vertex_normals() {
        if normals.len() != num_vertices {
            return Err(RenderError::InvalidMesh(format!(
                "{} vertex normals for {num_vertices} vertices",
                normals.len()
            )));
        }
    }
    Ok(())
}
