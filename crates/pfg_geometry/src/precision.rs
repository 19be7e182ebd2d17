//! Conversion between measurement precisions and covariances.
//!
//! Measurements carry one precision for the translational part and one for
//! the rotational part. A precision is the reciprocal of a variance.

use crate::{Dimension, Float, GeometryError, Matrix, Result};

#[inline]
fn strictly_positive_finite(value: Float) -> bool {
    value.is_finite() && value > 0.0
}

/// Convert translation and rotation variances into precisions.
///
/// # Errors
///
/// Returns [`GeometryError::NonPositiveCovariance`] if either covariance is
/// zero, negative, NaN or infinite.
pub fn precision_from_covariance(
    translation_covariance: Float,
    rotation_covariance: Float,
) -> Result<(Float, Float)> {
    for covariance in [translation_covariance, rotation_covariance] {
        if !strictly_positive_finite(covariance) {
            return Err(GeometryError::NonPositiveCovariance(covariance));
        }
    }
    Ok((1.0 / translation_covariance, 1.0 / rotation_covariance))
}

/// Convert translation and rotation precisions into variances.
///
/// # Errors
///
/// Returns [`GeometryError::NonPositivePrecision`] if either precision is
/// zero, negative, NaN or infinite.
pub fn covariance_from_precision(
    translation_precision: Float,
    rotation_precision: Float,
) -> Result<(Float, Float)> {
    for precision in [translation_precision, rotation_precision] {
        if !strictly_positive_finite(precision) {
            return Err(GeometryError::NonPositivePrecision(precision));
        }
    }
    Ok((1.0 / translation_precision, 1.0 / rotation_precision))
}

/// Diagonal covariance matrix of a relative pose measurement.
///
/// The first `dimension` entries are `1 / translation_precision`, the
/// remaining rotational entries are `1 / rotation_precision`.
/// In 2D this is `diag(1/tp, 1/tp, 1/rp)`.
#[must_use]
pub fn diagonal_covariance(
    dimension: Dimension,
    translation_precision: Float,
    rotation_precision: Float,
) -> Matrix {
    let translation_dofs = dimension.get();
    let n = dimension.pose_dofs();
    let mut covariance = Matrix::zeros((n, n));
    for i in 0..n {
        covariance[[i, i]] = if i < translation_dofs {
            1.0 / translation_precision
        } else {
            1.0 / rotation_precision
        };
    }
    covariance
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use arbtest::arbtest;
    use ndarray::array;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn odometry_covariances() {
        let (tp, rp) = precision_from_covariance(0.02 * 0.02, 0.002 * 0.002).expect("positive");
        assert_relative_eq!(tp, 2500.0, max_relative = 1e-12);
        assert_relative_eq!(rp, 250_000.0, max_relative = 1e-12);
    }

    #[test]
    fn zero_covariance_is_rejected() {
        assert_eq!(
            precision_from_covariance(0.0, 1.0),
            Err(GeometryError::NonPositiveCovariance(0.0))
        );
        assert_eq!(
            precision_from_covariance(1.0, -2.0),
            Err(GeometryError::NonPositiveCovariance(-2.0))
        );
        assert!(matches!(
            precision_from_covariance(1.0, Float::INFINITY),
            Err(GeometryError::NonPositiveCovariance(_))
        ));
        assert!(matches!(
            precision_from_covariance(Float::NAN, 1.0),
            Err(GeometryError::NonPositiveCovariance(_))
        ));
    }

    #[test]
    fn zero_precision_is_rejected() {
        assert_eq!(
            covariance_from_precision(1.0, 0.0),
            Err(GeometryError::NonPositivePrecision(0.0))
        );
    }

    #[test]
    fn round_trip() {
        arbtest(|u| {
            let tp = Float::from(u.int_in_range(1..=1_000_000_u32)?) * 1e-2;
            let rp = Float::from(u.int_in_range(1..=1_000_000_u32)?) * 1e-2;
            let (tc, rc) = covariance_from_precision(tp, rp).expect("positive");
            let (tp2, rp2) = precision_from_covariance(tc, rc).expect("positive");
            assert_relative_eq!(tp2, tp, max_relative = 1e-12);
            assert_relative_eq!(rp2, rp, max_relative = 1e-12);
            Ok(())
        });
    }

    #[test]
    fn planar_diagonal_covariance() {
        let covariance = diagonal_covariance(Dimension::Two, 4.0, 2.0);
        assert_eq!(
            covariance,
            array![[0.25, 0.0, 0.0], [0.0, 0.25, 0.0], [0.0, 0.0, 0.5]]
        );
    }

    #[test]
    fn spatial_diagonal_covariance() {
        let covariance = diagonal_covariance(Dimension::Three, 10.0, 100.0);
        assert_eq!(covariance.dim(), (6, 6));
        let diagonal = covariance.diag().to_vec();
        assert_eq!(diagonal, vec![0.1, 0.1, 0.1, 0.01, 0.01, 0.01]);
        assert_eq!(covariance.iter().filter(|x| **x != 0.0).count(), 6);
    }
}
