//! Orientation of a pose, planar or spatial.

use serde::Serialize;

use crate::{
    rotation::{
        angle_from_rotation_matrix, rotation_matrix_from_angle, rotation_matrix_from_rpy,
        rpy_from_rotation_matrix,
    },
    Dimension, Float, GeometryError, Matrix, Result,
};

/// Orientation of a pose, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    /// Heading in the plane
    Planar {
        /// Rotation about the z axis
        theta: Float,
    },
    /// Rotation `Rz(yaw) · Ry(pitch) · Rx(roll)`
    Spatial {
        /// Rotation about the x axis
        roll:  Float,
        /// Rotation about the y axis
        pitch: Float,
        /// Rotation about the z axis
        yaw:   Float,
    },
}

impl Orientation {
    /// Planar orientation with heading `theta`
    #[inline]
    #[must_use]
    pub const fn planar(theta: Float) -> Self {
        Self::Planar { theta }
    }

    /// Spatial orientation from roll, pitch and yaw
    #[inline]
    #[must_use]
    pub const fn spatial(roll: Float, pitch: Float, yaw: Float) -> Self {
        Self::Spatial { roll, pitch, yaw }
    }

    /// [`Dimension::Two`] for planar, [`Dimension::Three`] for spatial
    #[must_use]
    pub const fn dimension(&self) -> Dimension {
        match self {
            Self::Planar { .. } => Dimension::Two,
            Self::Spatial { .. } => Dimension::Three,
        }
    }

    /// Rotation about the vertical axis. For planar orientations this is
    /// `theta`.
    #[must_use]
    pub const fn heading(&self) -> Float {
        match *self {
            Self::Planar { theta } => theta,
            Self::Spatial { yaw, .. } => yaw,
        }
    }

    /// 2x2 rotation matrix in 2D, 3x3 in 3D
    #[must_use]
    pub fn rotation_matrix(&self) -> Matrix {
        match *self {
            Self::Planar { theta } => rotation_matrix_from_angle(theta),
            Self::Spatial { roll, pitch, yaw } => rotation_matrix_from_rpy(roll, pitch, yaw),
        }
    }

    /// Recover the orientation from a 2x2 or 3x3 rotation matrix.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::UnsupportedDimension`] for any other size.
    pub fn from_rotation_matrix(rotation: &Matrix) -> Result<Self> {
        match rotation.dim() {
            (2, 2) => Ok(Self::planar(angle_from_rotation_matrix(rotation)?)),
            (3, 3) => {
                let (roll, pitch, yaw) = rpy_from_rotation_matrix(rotation)?;
                Ok(Self::spatial(roll, pitch, yaw))
            }
            (rows, cols) if rows != cols => Err(GeometryError::NonSquareRotation(rows, cols)),
            (rows, _) => Err(GeometryError::UnsupportedDimension(rows)),
        }
    }
}
