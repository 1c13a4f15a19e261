//! Scene module
//!
//! The read-only [`SceneView`] the collector walks, the in-memory
//! [`SceneGraph`], and RON scene descriptions that build and capture it.

pub mod description;
pub mod scene_graph;

pub use description::{MeshLibrary, MeshSource, NodeDescription, SceneDescription};
pub use scene_graph::{MeshRenderer, NodeId, SceneError, SceneGraph, SceneNode, SceneView, AABB};
