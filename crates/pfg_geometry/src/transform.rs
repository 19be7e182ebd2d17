//! Homogeneous transformation matrices.
//!
//! A transformation in `d` dimensions is a `(d+1)x(d+1)` matrix with the
//! rotation in the upper left `d x d` block, the translation in the last
//! column and the fixed bottom row `[0, ..., 0, 1]`.

use ndarray::s;

use crate::{
    rotation::{rotation_matrix_from_angle, rotation_matrix_from_rpy},
    Float, GeometryError, Matrix, Result, Vector,
};

/// Embed `rotation` and `translation` in a homogeneous transformation.
///
/// # Errors
///
/// - [`GeometryError::NonSquareRotation`] if `rotation` is not square.
/// - [`GeometryError::UnsupportedDimension`] if `rotation` is not 2x2 or 3x3.
/// - [`GeometryError::TranslationLength`] if `translation` does not match.
pub fn transformation_matrix(rotation: &Matrix, translation: &Vector) -> Result<Matrix> {
    let (rows, cols) = rotation.dim();
    if rows != cols {
        return Err(GeometryError::NonSquareRotation(rows, cols));
    }
    if !(2..=3).contains(&rows) {
        return Err(GeometryError::UnsupportedDimension(rows));
    }
    if translation.len() != rows {
        return Err(GeometryError::TranslationLength {
            expected: rows,
            found:    translation.len(),
        });
    }

    let dim = rows;
    let mut transform = Matrix::eye(dim + 1);
    transform.slice_mut(s![..dim, ..dim]).assign(rotation);
    transform.slice_mut(s![..dim, dim]).assign(translation);
    Ok(transform)
}

/// Planar transformation from an angle and a 2D translation.
///
/// # Errors
///
/// Returns [`GeometryError::TranslationLength`] if `translation` is not 2D.
pub fn transformation_matrix_from_theta(theta: Float, translation: &Vector) -> Result<Matrix> {
    transformation_matrix(&rotation_matrix_from_angle(theta), translation)
}

/// Spatial transformation from `(roll, pitch, yaw)` and a 3D translation.
///
/// # Errors
///
/// Returns [`GeometryError::TranslationLength`] if `translation` is not 3D.
pub fn transformation_matrix_from_rpy(
    (roll, pitch, yaw): (Float, Float, Float),
    translation: &Vector,
) -> Result<Matrix> {
    transformation_matrix(&rotation_matrix_from_rpy(roll, pitch, yaw), translation)
}

/// Returns the size `d` of the rotation block, if `transform` is a 3x3 or 4x4
/// matrix.
fn homogeneous_dim(transform: &Matrix) -> Result<usize> {
    match transform.dim() {
        (3, 3) => Ok(2),
        (4, 4) => Ok(3),
        (rows, cols) => Err(GeometryError::NotHomogeneous(rows, cols)),
    }
}

/// Split a homogeneous transformation into its rotation and translation.
///
/// # Errors
///
/// Returns [`GeometryError::NotHomogeneous`] if `transform` is not 3x3 or 4x4.
pub fn split_transformation(transform: &Matrix) -> Result<(Matrix, Vector)> {
    let dim = homogeneous_dim(transform)?;
    let rotation = transform.slice(s![..dim, ..dim]).to_owned();
    let translation = transform.slice(s![..dim, dim]).to_owned();
    Ok((rotation, translation))
}

/// Closed form inverse of a rigid transformation, `[Rᵀ, -Rᵀ·t]`.
///
/// # Errors
///
/// Returns [`GeometryError::NotHomogeneous`] if `transform` is not 3x3 or 4x4.
pub fn invert_transformation(transform: &Matrix) -> Result<Matrix> {
    let (rotation, translation) = split_transformation(transform)?;
    let rotation_t = rotation.t().to_owned();
    let translation_inv = -rotation_t.dot(&translation);
    transformation_matrix(&rotation_t, &translation_inv)
}

/// Relative motion from `prev` to `curr`, both absolute transformations in
/// the same frame. Computes `prev⁻¹ · curr` and returns its rotation and
/// translation, so that `prev · T(rotation, translation) == curr`.
///
/// # Errors
///
/// - [`GeometryError::NotHomogeneous`] if either matrix is not 3x3 or 4x4.
/// - [`GeometryError::TranslationLength`] if the two have different sizes.
pub fn relative_pose(prev: &Matrix, curr: &Matrix) -> Result<(Matrix, Vector)> {
    let prev_dim = homogeneous_dim(prev)?;
    let curr_dim = homogeneous_dim(curr)?;
    if prev_dim != curr_dim {
        return Err(GeometryError::TranslationLength {
            expected: prev_dim,
            found:    curr_dim,
        });
    }
    let relative = invert_transformation(prev)?.dot(curr);
    split_transformation(&relative)
}
