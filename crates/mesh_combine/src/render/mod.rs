//! Render-side data consumed by mesh combination
//!
//! Source meshes and the materials bound to them. Neither type knows about a
//! graphics backend; combined output lives in [`crate::combine`].

pub mod material;
pub mod mesh;

pub use material::{Material, MaterialId, MaterialRegistry};
pub use mesh::Mesh;
