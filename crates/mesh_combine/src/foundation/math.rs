//! Math utilities and types
//!
//! Provides the math types used by mesh combination: nalgebra aliases, a TRS
//! transform for scene nodes, and the normal matrix used to carry surface
//! normals through an affine transform.

pub use nalgebra::{
    Vector3,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position relative to the parent
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform from position, Euler rotation (radians, roll/pitch/yaw) and scale
    pub fn from_euler(position: Vec3, euler: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::from_euler_angles(euler.x, euler.y, euler.z),
            scale,
        }
    }

    /// Builder pattern: Set rotation from axis-angle
    pub fn with_rotation_axis_angle(mut self, axis: Vec3, angle: f32) -> Self {
        self.rotation = Quat::from_axis_angle(&Unit::new_normalize(axis), angle);
        self
    }

    /// Builder pattern: Set scale (non-uniform)
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Builder pattern: Set scale (uniform)
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::new(scale, scale, scale);
        self
    }

    /// Euler angles (roll, pitch, yaw) of the rotation
    pub fn euler_angles(&self) -> Vec3 {
        let (roll, pitch, yaw) = self.rotation.euler_angles();
        Vec3::new(roll, pitch, yaw)
    }

    /// Convert to a transformation matrix (TRS order)
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// Transform a position by an affine matrix (homogeneous w = 1)
pub fn transform_position(matrix: &Mat4, position: &Vec3) -> Vec3 {
    matrix.transform_point(&Point3::from(*position)).coords
}

/// Upper-left 3x3 block of an affine matrix
pub fn linear_part(matrix: &Mat4) -> Mat3 {
    matrix.fixed_view::<3, 3>(0, 0).into_owned()
}

/// Matrix that carries normals through an affine transform
///
/// Normals transform by the inverse-transpose of the linear part. When that
/// part is singular the inverse does not exist and the linear part itself is
/// used instead; the determinant is kept so callers can report it.
///
/// Singularity is judged on the determinant relative to the product of the
/// column lengths, so uniformly tiny or huge scales are not singular.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalMatrix {
    /// Inverse-transpose of the linear part
    InverseTranspose(Mat3),
    /// Linear part used directly because its determinant is near zero
    Singular {
        /// Linear part of the source transform
        linear: Mat3,
        /// Determinant that failed the singularity test
        determinant: f32,
    },
}

impl NormalMatrix {
    /// Build the normal matrix for `matrix`
    ///
    /// The linear part counts as singular when
    /// `|det| <= epsilon * |c0| * |c1| * |c2|`. The ratio is 1 for orthogonal
    /// columns of any length and drops to 0 as the columns flatten.
    pub fn from_affine(matrix: &Mat4, epsilon: f32) -> Self {
        let linear = linear_part(matrix);
        let determinant = linear.determinant();
        let column_volume: f32 = linear.column_iter().map(|column| column.norm()).product();

        if !determinant.is_finite() || determinant.abs() <= epsilon * column_volume {
            return Self::Singular { linear, determinant };
        }

        match linear.try_inverse() {
            Some(inverse) => Self::InverseTranspose(inverse.transpose()),
            None => Self::Singular { linear, determinant },
        }
    }

    /// The 3x3 matrix applied to normals
    pub fn matrix(&self) -> &Mat3 {
        match self {
            Self::InverseTranspose(matrix) => matrix,
            Self::Singular { linear, .. } => linear,
        }
    }

    /// Whether the fallback path was taken
    pub fn is_singular(&self) -> bool {
        matches!(self, Self::Singular { .. })
    }

    /// Transform a normal and re-normalize it
    ///
    /// Normals that collapse to zero length stay zero.
    pub fn transform(&self, normal: &Vec3) -> Vec3 {
        let transformed = self.matrix() * normal;
        let length = transformed.norm();
        if length > f32::EPSILON {
            transformed / length
        } else {
            Vec3::zeros()
        }
    }
}
