//! # Mesh Combine
//!
//! Merges the meshes under a scene node into one mesh per material, cutting
//! draw calls for static geometry.
//!
//! ## Features
//!
//! - **Instance collection**: depth-first walk over any [`scene::SceneView`]
//!   with a pluggable exclusion policy
//! - **Mesh combination**: transformed positions and normals, one submesh
//!   range per source instance, optional triangle strip re-encoding
//! - **Scene collaborators**: in-memory scene graph, RON scene descriptions,
//!   OBJ import and export
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mesh_combine::prelude::*;
//!
//! let mut scene = SceneGraph::new();
//! let mut materials = MaterialRegistry::new();
//! let stone = materials.get_or_register("Stone");
//!
//! let root = scene.add_root("Ruins", Transform::identity());
//! let pillar = scene.add_child(root, "Pillar", Transform::from_position(Vec3::new(2.0, 0.0, 0.0)))?;
//! scene.set_renderer(pillar, MeshRenderer::new(Arc::new(Mesh::cube()), vec![stone]))?;
//!
//! let report = combine_children(&scene, root, &CombineConfig::default());
//! for (material, mesh) in &report.meshes {
//!     println!("{:?}: {} triangles", material, mesh.triangle_count());
//! }
//! # Ok::<(), SceneError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod render;
pub mod scene;
pub mod combine;
pub mod assets;

/// Common imports for library users
pub mod prelude {
    pub use std::sync::Arc;

    pub use crate::{
        assets::{ObjError, ObjLoader},
        combine::{
            collect, combine, combine_children, combine_children_with, CombineError, CombineOptions,
            CombineReport, CombineWarning, CombinedMesh, ExclusionPolicy, MaterialGroups,
            MeshCombiner, MeshInstance, NamePatternExclusion, Topology,
        },
        config::{CombineConfig, Config, ConfigError},
        foundation::math::{Mat4, Transform, Vec3},
        render::{Material, MaterialId, MaterialRegistry, Mesh},
        scene::{
            MeshLibrary, MeshRenderer, MeshSource, NodeId, SceneDescription, SceneError, SceneGraph,
            SceneView,
        },
    };
}
