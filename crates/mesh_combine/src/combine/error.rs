//! Combine errors and warnings

use std::fmt;

use crate::render::MaterialId;

/// Result type for combine operations
pub type CombineResult<T> = Result<T, CombineError>;

/// Why an instance cannot be combined
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidInstanceReason {
    /// The instance carries no mesh data
    #[error("instance has no mesh")]
    MissingMesh,

    /// The submesh index does not exist on the mesh
    #[error("submesh {submesh} out of range (mesh has {count})")]
    SubmeshOutOfRange {
        /// Requested submesh
        submesh: usize,
        /// Submeshes on the mesh
        count: usize,
    },

    /// Normals are not parallel to positions
    #[error("mesh has {normals} normals for {positions} positions")]
    NormalCountMismatch {
        /// Number of positions
        positions: usize,
        /// Number of normals
        normals: usize,
    },

    /// An index points past the vertex array
    #[error("index {index} out of range (mesh has {vertex_count} vertices)")]
    IndexOutOfRange {
        /// Offending index value
        index: u32,
        /// Vertices on the mesh
        vertex_count: usize,
    },

    /// The submesh is not a whole number of triangles
    #[error("submesh has {len} indices, not a multiple of 3")]
    NotTriangleList {
        /// Number of indices in the submesh
        len: usize,
    },
}

/// Errors that abort the combination of one material group
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CombineError {
    /// No instances were supplied
    #[error("cannot combine an empty instance list")]
    EmptyInput,

    /// One instance is malformed; `index` is its position in the input
    #[error("invalid instance at position {index}: {reason}")]
    InvalidInstance {
        /// Position of the instance in the input sequence
        index: usize,
        /// What is wrong with it
        reason: InvalidInstanceReason,
    },

    /// The combined vertex count no longer fits a 32-bit index
    #[error("combined mesh needs {count} vertices, more than a 32-bit index can address")]
    VertexLimitExceeded {
        /// Vertex count that was reached
        count: usize,
    },
}

/// Non-fatal conditions recorded on a combined mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CombineWarning {
    /// The instance transform has a (near) zero determinant; its normals
    /// were carried by the linear part instead of the inverse-transpose
    TransformSingularity {
        /// Position of the instance in the input sequence
        instance: usize,
        /// Determinant of the transform's linear part
        determinant: f32,
    },
}

impl fmt::Display for CombineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransformSingularity { instance, determinant } => write!(
                f,
                "instance {instance} has a singular transform (determinant {determinant:e}), normals use the linear part"
            ),
        }
    }
}

/// A material group whose combination failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to combine material group {material:?}: {error}")]
pub struct MaterialGroupError {
    /// Material shared by the group
    pub material: MaterialId,
    /// Underlying failure
    #[source]
    pub error: CombineError,
}
