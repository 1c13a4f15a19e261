//! Output of one combine call

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::error::CombineWarning;
use super::strip::{list_to_triangles, strip_to_triangles};
use crate::foundation::math::Vec3;
use crate::render::Mesh;
use crate::scene::AABB;

/// How an index range encodes its triangles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Topology {
    /// Every three indices form one triangle
    #[default]
    TriangleList,
    /// Each index after the first two forms a triangle with the previous two
    TriangleStrip,
}

/// Contiguous span of the combined index buffer, one per input instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubMeshRange {
    /// First index in the shared buffer
    pub start: usize,
    /// Number of indices
    pub count: usize,
    /// Encoding of this span
    pub topology: Topology,
}

impl SubMeshRange {
    /// One past the last index
    pub fn end(&self) -> usize {
        self.start + self.count
    }

    /// Span as a range into the index buffer
    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

/// Vertex and index buffers of one material group
///
/// `vertices` and `normals` always have the same length, every index is in
/// range, and `submeshes[i]` holds the geometry of input instance `i`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CombinedMesh {
    /// Positions in the target space
    pub vertices: Vec<Vec3>,
    /// Unit normals parallel to `vertices`
    pub normals: Vec<Vec3>,
    /// Shared index buffer
    pub indices: Vec<u32>,
    /// Per-instance spans of `indices`, in input order
    pub submeshes: Vec<SubMeshRange>,
    /// Non-fatal conditions met while combining
    pub warnings: Vec<CombineWarning>,
}

impl CombinedMesh {
    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of indices in the shared buffer
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Number of submesh ranges
    pub fn submesh_count(&self) -> usize {
        self.submeshes.len()
    }

    /// Indices of submesh `index` in its own encoding
    pub fn submesh_indices(&self, index: usize) -> Option<&[u32]> {
        let range = self.submeshes.get(index)?;
        self.indices.get(range.range())
    }

    /// Triangles drawn by submesh `index`, strips decoded
    pub fn submesh_triangles(&self, index: usize) -> Option<Vec<[u32; 3]>> {
        let range = self.submeshes.get(index)?;
        let indices = self.indices.get(range.range())?;
        Some(match range.topology {
            Topology::TriangleList => list_to_triangles(indices),
            Topology::TriangleStrip => strip_to_triangles(indices),
        })
    }

    /// Every triangle in the mesh, submesh by submesh
    pub fn triangles(&self) -> Vec<[u32; 3]> {
        (0..self.submeshes.len())
            .filter_map(|index| self.submesh_triangles(index))
            .flatten()
            .collect()
    }

    /// Number of non-degenerate triangles drawn
    pub fn triangle_count(&self) -> usize {
        self.triangles().len()
    }

    /// Bounding box of all vertices
    pub fn bounds(&self) -> Option<AABB> {
        AABB::from_points(&self.vertices)
    }

    /// Convert to a source mesh with one triangle-list submesh per range
    ///
    /// Lets a combined mesh be attached to a renderer, exported and combined
    /// again like any other mesh.
    pub fn to_mesh(&self, name: impl Into<String>) -> Mesh {
        let submeshes = (0..self.submesh_count())
            .map(|index| {
                self.submesh_triangles(index)
                    .unwrap_or_default()
                    .into_iter()
                    .flatten()
                    .collect()
            })
            .collect();
        Mesh::new(name, self.vertices.clone(), self.normals.clone(), submeshes)
    }

    /// Positions as tightly packed `f32` triples, ready for upload
    pub fn position_bytes(&self) -> Vec<u8> {
        pack_vectors(&self.vertices)
    }

    /// Normals as tightly packed `f32` triples
    pub fn normal_bytes(&self) -> Vec<u8> {
        pack_vectors(&self.normals)
    }

    /// Index buffer as raw bytes
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

fn pack_vectors(vectors: &[Vec3]) -> Vec<u8> {
    let packed: Vec<[f32; 3]> = vectors.iter().map(|v| [v.x, v.y, v.z]).collect();
    bytemuck::cast_slice(&packed).to_vec()
}
