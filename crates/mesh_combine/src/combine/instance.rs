//! Mesh instances fed to the combiner

use std::sync::Arc;

use crate::foundation::collections::OrderedGroups;
use crate::foundation::math::Mat4;
use crate::render::{MaterialId, Mesh};

/// One submesh of one source mesh, placed in the target space
#[derive(Debug, Clone)]
pub struct MeshInstance {
    /// Source mesh; `None` is rejected by the combiner
    pub mesh: Option<Arc<Mesh>>,

    /// Maps the instance's local space into the target's local space
    pub transform: Mat4,

    /// Which index range of `mesh` this instance contributes
    pub submesh_index: usize,
}

impl MeshInstance {
    /// Create an instance of `mesh`'s submesh `submesh_index`
    pub fn new(mesh: Arc<Mesh>, transform: Mat4, submesh_index: usize) -> Self {
        Self {
            mesh: Some(mesh),
            transform,
            submesh_index,
        }
    }

    /// Indices this instance contributes, zero when the submesh is missing
    pub fn index_count(&self) -> usize {
        self.mesh
            .as_ref()
            .and_then(|mesh| mesh.submesh(self.submesh_index))
            .map_or(0, <[u32]>::len)
    }
}

/// Instances grouped by material, in first-seen material order
pub type MaterialGroups = OrderedGroups<MaterialId, MeshInstance>;
