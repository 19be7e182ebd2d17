//! Construction of rotation matrices and recovery of angles from them.
//! All angles are in radians.

use ndarray::array;

use crate::{Float, GeometryError, Matrix, Result};

/// Below this value `cos(pitch)` is treated as zero when recovering
/// roll/pitch/yaw, i.e. the rotation is in gimbal lock.
const GIMBAL_LOCK_EPSILON: Float = 1e-9;

/// Planar rotation by `theta`.
/// ```
/// use pfg_geometry::rotation_matrix_from_angle;
/// let r = rotation_matrix_from_angle(0.0);
/// assert_eq!(r, pfg_geometry::array![[1.0, -0.0], [0.0, 1.0]]);
/// ```
#[must_use]
pub fn rotation_matrix_from_angle(theta: Float) -> Matrix {
    let (sin, cos) = theta.sin_cos();
    array![[cos, -sin], [sin, cos]]
}

/// Spatial rotation `Rz(yaw) · Ry(pitch) · Rx(roll)`.
#[must_use]
pub fn rotation_matrix_from_rpy(roll: Float, pitch: Float, yaw: Float) -> Matrix {
    let (sr, cr) = roll.sin_cos();
    let (sp, cp) = pitch.sin_cos();
    let (sy, cy) = yaw.sin_cos();

    array![
        [cy * cp, cy * sp * sr - sy * cr, cy * sp * cr + sy * sr],
        [sy * cp, sy * sp * sr + cy * cr, sy * sp * cr - cy * sr],
        [-sp, cp * sr, cp * cr]
    ]
}

/// Angle of a planar rotation matrix, `atan2(R[1,0], R[0,0])`.
/// Also accepts a homogeneous 3x3 transformation, since only the upper left
/// block is read.
///
/// # Errors
///
/// Returns [`GeometryError::NonSquareRotation`] if the matrix is smaller than
/// 2x2 or not square.
pub fn angle_from_rotation_matrix(rotation: &Matrix) -> Result<Float> {
    let (rows, cols) = rotation.dim();
    if rows != cols || rows < 2 {
        return Err(GeometryError::NonSquareRotation(rows, cols));
    }
    Ok(rotation[[1, 0]].atan2(rotation[[0, 0]]))
}

/// Inverse of [`rotation_matrix_from_rpy`]. Returns `(roll, pitch, yaw)`.
///
/// In gimbal lock (`pitch = ±π/2`) roll and yaw are not separable, so yaw is
/// fixed to zero and the whole rotation about the vertical goes into roll.
///
/// # Errors
///
/// Returns [`GeometryError::NonSquareRotation`] if the matrix is not 3x3.
pub fn rpy_from_rotation_matrix(rotation: &Matrix) -> Result<(Float, Float, Float)> {
    let (rows, cols) = rotation.dim();
    if rows != 3 || cols != 3 {
        return Err(GeometryError::NonSquareRotation(rows, cols));
    }

    let cos_pitch = rotation[[0, 0]].hypot(rotation[[1, 0]]);
    let pitch = (-rotation[[2, 0]]).atan2(cos_pitch);

    if cos_pitch < GIMBAL_LOCK_EPSILON {
        let roll = (-rotation[[1, 2]]).atan2(rotation[[1, 1]]);
        return Ok((roll, pitch, 0.0));
    }

    let roll = rotation[[2, 1]].atan2(rotation[[2, 2]]);
    let yaw = rotation[[1, 0]].atan2(rotation[[0, 0]]);
    Ok((roll, pitch, yaw))
}
