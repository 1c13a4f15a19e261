//! Mesh combination
//!
//! [`collect`] turns a scene subtree into per-material [`MeshInstance`] lists,
//! [`MeshCombiner`] merges one list into a [`CombinedMesh`], and
//! [`combine_children`] runs both for every material under a node.

pub mod batch;
pub mod collector;
pub mod combined_mesh;
pub mod combiner;
pub mod error;
pub mod instance;
pub mod strip;

pub use batch::{combine_children, combine_children_with, combine_groups, CombineReport};
pub use collector::{collect, ExclusionPolicy, NamePatternExclusion};
pub use combined_mesh::{CombinedMesh, SubMeshRange, Topology};
pub use combiner::{combine, CombineOptions, MeshCombiner};
pub use error::{
    CombineError, CombineResult, CombineWarning, InvalidInstanceReason, MaterialGroupError,
};
pub use instance::{MaterialGroups, MeshInstance};
