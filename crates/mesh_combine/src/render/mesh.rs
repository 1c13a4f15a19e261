//! Source mesh representation
//!
//! A [`Mesh`] owns one shared vertex array (positions and normals of equal
//! length) and any number of submeshes. Each submesh is an independent
//! triangle list indexing into the shared vertices; by convention a renderer
//! binds one material per submesh slot.

use crate::foundation::math::Vec3;
use crate::scene::AABB;

/// Mesh geometry with one vertex array and several index ranges
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Name used in logs and exported files
    pub name: String,

    /// Vertex positions in the mesh's local space
    pub positions: Vec<Vec3>,

    /// Vertex normals, parallel to `positions`
    pub normals: Vec<Vec3>,

    /// Triangle-list index arrays, one per submesh
    pub submeshes: Vec<Vec<u32>>,
}

impl Mesh {
    /// Create a new mesh
    pub fn new(
        name: impl Into<String>,
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        submeshes: Vec<Vec<u32>>,
    ) -> Self {
        Self {
            name: name.into(),
            positions,
            normals,
            submeshes,
        }
    }

    /// Create a mesh with a single submesh
    pub fn single(
        name: impl Into<String>,
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        indices: Vec<u32>,
    ) -> Self {
        Self::new(name, positions, normals, vec![indices])
    }

    /// Build a mesh from loose triangles, one vertex per corner with flat normals
    pub fn from_triangles(name: impl Into<String>, triangles: &[[Vec3; 3]]) -> Self {
        let mut positions = Vec::with_capacity(triangles.len() * 3);
        let mut normals = Vec::with_capacity(triangles.len() * 3);

        for [a, b, c] in triangles {
            let face_normal = (b - a).cross(&(c - a));
            let length = face_normal.norm();
            let normal = if length > f32::EPSILON {
                face_normal / length
            } else {
                Vec3::new(0.0, 1.0, 0.0)
            };

            positions.extend_from_slice(&[*a, *b, *c]);
            normals.extend_from_slice(&[normal, normal, normal]);
        }

        let indices = (0..positions.len() as u32).collect();
        Self::single(name, positions, normals, indices)
    }

    /// Append a submesh and return its index
    pub fn push_submesh(&mut self, indices: Vec<u32>) -> usize {
        self.submeshes.push(indices);
        self.submeshes.len() - 1
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of submeshes
    pub fn submesh_count(&self) -> usize {
        self.submeshes.len()
    }

    /// Index array of one submesh
    pub fn submesh(&self, index: usize) -> Option<&[u32]> {
        self.submeshes.get(index).map(Vec::as_slice)
    }

    /// Total number of indices across all submeshes
    pub fn index_count(&self) -> usize {
        self.submeshes.iter().map(Vec::len).sum()
    }

    /// Total number of triangles across all submeshes
    pub fn triangle_count(&self) -> usize {
        self.index_count() / 3
    }

    /// Bounding box of all vertices
    pub fn bounds(&self) -> Option<AABB> {
        AABB::from_points(&self.positions)
    }

    /// Unit cube centered at the origin
    ///
    /// Each face has its own four vertices so normals stay flat:
    /// 24 vertices, 36 indices, one submesh.
    pub fn cube() -> Self {
        // (normal, u, v) with u x v == normal so corners wind counter-clockwise
        let faces = [
            (Vec3::x(), Vec3::y(), Vec3::z()),
            (-Vec3::x(), Vec3::z(), Vec3::y()),
            (Vec3::y(), Vec3::z(), Vec3::x()),
            (-Vec3::y(), Vec3::x(), Vec3::z()),
            (Vec3::z(), Vec3::x(), Vec3::y()),
            (-Vec3::z(), Vec3::y(), Vec3::x()),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut normals = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (normal, u, v) in faces {
            let base = positions.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                positions.push((normal + u * su + v * sv) * 0.5);
                normals.push(normal);
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }

        Self::single("cube", positions, normals, indices)
    }

    /// Unit quad in the XZ plane facing +Y
    pub fn quad() -> Self {
        let mut quad = Self::grid(1, 1);
        for position in &mut quad.positions {
            position.x -= 0.5;
            position.z -= 0.5;
        }
        quad.name = "quad".to_string();
        quad
    }

    /// Flat grid of `columns` x `rows` unit cells in the XZ plane facing +Y
    ///
    /// Vertices are shared between neighbouring cells and each row of cells is
    /// indexed in strip order, so a row encodes as a single triangle strip.
    pub fn grid(columns: u32, rows: u32) -> Self {
        let stride = columns + 1;
        let mut positions = Vec::with_capacity(((columns + 1) * (rows + 1)) as usize);
        for j in 0..=rows {
            for i in 0..=columns {
                positions.push(Vec3::new(i as f32, 0.0, j as f32));
            }
        }
        let normals = vec![Vec3::y(); positions.len()];

        let vertex = |i: u32, j: u32| j * stride + i;
        let mut indices = Vec::with_capacity((columns * rows * 6) as usize);
        for j in 0..rows {
            for i in 0..columns {
                let a = vertex(i, j);
                let b = vertex(i, j + 1);
                let c = vertex(i + 1, j);
                let d = vertex(i + 1, j + 1);
                indices.extend_from_slice(&[a, b, c, c, b, d]);
            }
        }

        Self::single(format!("grid-{columns}x{rows}"), positions, normals, indices)
    }
}
