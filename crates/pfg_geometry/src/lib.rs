#![warn(missing_docs)]
//! Geometry kernel for pose graphs.
//!
//! Pure functions for building 2D/3D rotation and homogeneous transformation
//! matrices, extracting relative poses between two absolute poses, and
//! converting between measurement precisions and covariances.
//! Nothing in here holds state.

pub mod orientation;
pub mod precision;
pub mod rotation;
pub mod transform;

pub use orientation::Orientation;
pub use precision::{covariance_from_precision, diagonal_covariance, precision_from_covariance};
pub use rotation::{
    angle_from_rotation_matrix, rotation_matrix_from_angle, rotation_matrix_from_rpy,
    rpy_from_rotation_matrix,
};
pub use transform::{
    invert_transformation, relative_pose, split_transformation, transformation_matrix,
    transformation_matrix_from_rpy, transformation_matrix_from_theta,
};

/// prelude module bringing entire public API into scope
pub mod prelude {
    pub use super::{
        angle_from_rotation_matrix, covariance_from_precision, diagonal_covariance,
        invert_transformation, precision_from_covariance, relative_pose,
        rotation_matrix_from_angle, rotation_matrix_from_rpy, rpy_from_rotation_matrix,
        split_transformation, transformation_matrix, transformation_matrix_from_rpy,
        transformation_matrix_from_theta, Dimension, Float, GeometryError, Matrix, MatrixView,
        Orientation, Vector, VectorView,
    };
}

pub use ndarray::array;

/// The precision of the floating point type used throughout the pose graph.
pub type Float = f64;

/// Owned column vector, e.g. a position or a translation
pub type Vector = ndarray::Array1<Float>;
/// Owned matrix, e.g. a rotation or a homogeneous transformation
pub type Matrix = ndarray::Array2<Float>;
/// Borrowed [`Vector`]
pub type VectorView<'a> = ndarray::ArrayView1<'a, Float>;
/// Borrowed [`Matrix`]
pub type MatrixView<'a> = ndarray::ArrayView2<'a, Float>;

/// Errors raised by the geometry kernel.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// A rotation matrix must be square
    #[error("the rotation matrix is not square, it has shape {0}x{1}")]
    NonSquareRotation(usize, usize),
    /// Only 2D and 3D rotations are supported
    #[error("unsupported dimension {0}, only 2 and 3 are supported")]
    UnsupportedDimension(usize),
    /// Translation does not fit the rotation it is combined with
    #[error("translation has length {found}, but the rotation expects {expected}")]
    TranslationLength {
        /// Length implied by the rotation
        expected: usize,
        /// Actual length of the translation
        found:    usize,
    },
    /// The matrix is not a homogeneous transformation of size 3x3 or 4x4
    #[error("a {0}x{1} matrix is not a homogeneous transformation")]
    NotHomogeneous(usize, usize),
    /// Covariances must be strictly positive and finite to have a precision
    #[error("covariance {0} is not strictly positive and finite")]
    NonPositiveCovariance(Float),
    /// Precisions must be strictly positive and finite to have a covariance
    #[error("precision {0} is not strictly positive and finite")]
    NonPositivePrecision(Float),
}

/// Result type for the geometry kernel
pub type Result<T> = std::result::Result<T, GeometryError>;

/// Spatial dimension of a pose graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dimension {
    /// Planar poses `(x, y, theta)`
    #[default]
    Two,
    /// Spatial poses `(x, y, z, roll, pitch, yaw)`
    Three,
}

impl Dimension {
    /// Number of translational degrees of freedom
    #[inline]
    #[must_use]
    pub const fn get(self) -> usize {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }

    /// Number of rotational degrees of freedom
    #[inline]
    #[must_use]
    pub const fn rotation_dofs(self) -> usize {
        match self {
            Self::Two => 1,
            Self::Three => 3,
        }
    }

    /// Total degrees of freedom of a pose in this dimension
    #[inline]
    #[must_use]
    pub const fn pose_dofs(self) -> usize {
        self.get() + self.rotation_dofs()
    }
}

impl TryFrom<usize> for Dimension {
    type Error = GeometryError;

    fn try_from(value: usize) -> Result<Self> {
        match value {
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            other => Err(GeometryError::UnsupportedDimension(other)),
        }
    }
}

impl From<Dimension> for usize {
    fn from(value: Dimension) -> Self {
        value.get()
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}D", self.get())
    }
}

impl serde::Serialize for Dimension {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u64(self.get() as u64)
    }
}

impl<'de> serde::Deserialize<'de> for Dimension {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = usize::deserialize(deserializer)?;
        Self::try_from(value).map_err(serde::de::Error::custom)
    }
}

/// Serialize an ndarray vector as a plain sequence of numbers.
/// Use with `#[serde(serialize_with = "pfg_geometry::serialize_vector")]`.
///
/// # Errors
///
/// Forwards any error from the serializer.
pub fn serialize_vector<S>(vector: &Vector, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(vector.iter())
}
