use delegate::delegate;
use pfg_geometry::{array, diagonal_covariance, Dimension, Float, Matrix, Orientation, Vector};
use serde::Serialize;
use typed_floats::StrictlyPositiveFinite;

use super::{MeasurementError, PrecisionKind, Result};

/// The geometric payload shared by [`PoseMeasurement`] and
/// [`AmbiguousPoseMeasurement`].
///
/// **Invariants**:
/// - `translation` has as many components as `orientation` has dimensions.
/// - Both precisions are strictly positive and finite.
#[derive(Debug, Clone, PartialEq, Serialize)]
struct RelativePose {
    #[serde(serialize_with = "pfg_geometry::serialize_vector")]
    translation: Vector,
    orientation: Orientation,
    translation_precision: StrictlyPositiveFinite<Float>,
    rotation_precision: StrictlyPositiveFinite<Float>,
}

impl RelativePose {
    fn new(
        translation: Vector,
        orientation: Orientation,
        translation_precision: Float,
        rotation_precision: Float,
    ) -> Result<Self> {
        if translation.len() != orientation.dimension().get() {
            return Err(MeasurementError::DimensionMismatch {
                translation: translation.len(),
                rotation:    orientation.dimension(),
            });
        }
        let translation_precision = StrictlyPositiveFinite::<Float>::new(translation_precision)
            .map_err(|_| MeasurementError::NonPositivePrecision {
                kind:  PrecisionKind::Translation,
                value: translation_precision,
            })?;
        let rotation_precision = StrictlyPositiveFinite::<Float>::new(rotation_precision)
            .map_err(|_| MeasurementError::NonPositivePrecision {
                kind:  PrecisionKind::Rotation,
                value: rotation_precision,
            })?;

        Ok(Self {
            translation,
            orientation,
            translation_precision,
            rotation_precision,
        })
    }

    const fn dimension(&self) -> Dimension {
        self.orientation.dimension()
    }

    fn x(&self) -> Float {
        self.translation[0]
    }

    fn y(&self) -> Float {
        self.translation[1]
    }

    fn z(&self) -> Option<Float> {
        self.translation.get(2).copied()
    }

    const fn theta(&self) -> Float {
        self.orientation.heading()
    }

    const fn orientation(&self) -> Orientation {
        self.orientation
    }

    fn translation_precision(&self) -> Float {
        self.translation_precision.get()
    }

    fn rotation_precision(&self) -> Float {
        self.rotation_precision.get()
    }

    fn rotation_matrix(&self) -> Matrix {
        self.orientation.rotation_matrix()
    }

    fn translation_vector(&self) -> Vector {
        self.translation.clone()
    }

    fn transformation_matrix(&self) -> Matrix {
        pfg_geometry::transformation_matrix(&self.rotation_matrix(), &self.translation)
            .expect("translation and orientation have the same dimension")
    }

    fn covariance(&self) -> Matrix {
        diagonal_covariance(
            self.dimension(),
            self.translation_precision(),
            self.rotation_precision(),
        )
    }
}

/// A relative pose measurement from `base_pose` to `to_pose`, expressed in
/// the frame of `base_pose`. Used for both odometry and loop closures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoseMeasurement {
    base_pose: String,
    to_pose:   String,
    #[serde(flatten)]
    relative:  RelativePose,
}

impl PoseMeasurement {
    /// Create a new pose measurement.
    ///
    /// # Errors
    ///
    /// - [`MeasurementError::DimensionMismatch`] if `translation` does not
    ///   match the dimension of `orientation`.
    /// - [`MeasurementError::NonPositivePrecision`] if a precision is not
    ///   strictly positive and finite.
    pub fn new(
        base_pose: impl Into<String>,
        to_pose: impl Into<String>,
        translation: Vector,
        orientation: Orientation,
        translation_precision: Float,
        rotation_precision: Float,
    ) -> Result<Self> {
        Ok(Self {
            base_pose: base_pose.into(),
            to_pose:   to_pose.into(),
            relative:  RelativePose::new(
                translation,
                orientation,
                translation_precision,
                rotation_precision,
            )?,
        })
    }

    /// Create a planar pose measurement from `(x, y, theta)`.
    ///
    /// # Errors
    ///
    /// Returns [`MeasurementError::NonPositivePrecision`] if a precision is not
    /// strictly positive and finite.
    pub fn new_2d(
        base_pose: impl Into<String>,
        to_pose: impl Into<String>,
        (x, y, theta): (Float, Float, Float),
        translation_precision: Float,
        rotation_precision: Float,
    ) -> Result<Self> {
        Self::new(
            base_pose,
            to_pose,
            array![x, y],
            Orientation::planar(theta),
            translation_precision,
            rotation_precision,
        )
    }

    #[inline]
    pub fn base_pose(&self) -> &str {
        &self.base_pose
    }

    #[inline]
    pub fn to_pose(&self) -> &str {
        &self.to_pose
    }

    delegate! {
        to self.relative {
            pub fn dimension(&self) -> Dimension;
            pub fn x(&self) -> Float;
            pub fn y(&self) -> Float;
            /// `None` for planar measurements
            pub fn z(&self) -> Option<Float>;
            /// Change in heading; `theta` in 2D and `yaw` in 3D
            pub fn theta(&self) -> Float;
            pub fn orientation(&self) -> Orientation;
            pub fn translation_precision(&self) -> Float;
            pub fn rotation_precision(&self) -> Float;
            pub fn rotation_matrix(&self) -> Matrix;
            pub fn translation_vector(&self) -> Vector;
            #[allow(clippy::missing_panics_doc)]
            pub fn transformation_matrix(&self) -> Matrix;
            /// Diagonal covariance, `diag(1/tp, 1/tp, 1/rp)` in 2D.
            pub fn covariance(&self) -> Matrix;
        }
    }
}

/// A pose measurement whose data association may be wrong.
/// `measured_to_pose` is the pose the front-end believed the measurement to
/// be to, `true_to_pose` is the pose it actually is to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmbiguousPoseMeasurement {
    base_pose: String,
    measured_to_pose: String,
    true_to_pose: String,
    #[serde(flatten)]
    relative: RelativePose,
}

impl AmbiguousPoseMeasurement {
    /// Create a new ambiguous pose measurement.
    ///
    /// # Errors
    ///
    /// Same as [`PoseMeasurement::new`].
    pub fn new(
        base_pose: impl Into<String>,
        measured_to_pose: impl Into<String>,
        true_to_pose: impl Into<String>,
        translation: Vector,
        orientation: Orientation,
        translation_precision: Float,
        rotation_precision: Float,
    ) -> Result<Self> {
        Ok(Self {
            base_pose: base_pose.into(),
            measured_to_pose: measured_to_pose.into(),
            true_to_pose: true_to_pose.into(),
            relative: RelativePose::new(
                translation,
                orientation,
                translation_precision,
                rotation_precision,
            )?,
        })
    }

    #[inline]
    pub fn base_pose(&self) -> &str {
        &self.base_pose
    }

    #[inline]
    pub fn measured_to_pose(&self) -> &str {
        &self.measured_to_pose
    }

    #[inline]
    pub fn true_to_pose(&self) -> &str {
        &self.true_to_pose
    }

    /// `true` if the believed association differs from the true one
    #[inline]
    pub fn is_misassociated(&self) -> bool {
        self.measured_to_pose != self.true_to_pose
    }

    delegate! {
        to self.relative {
            pub fn dimension(&self) -> Dimension;
            pub fn x(&self) -> Float;
            pub fn y(&self) -> Float;
            pub fn z(&self) -> Option<Float>;
            pub fn theta(&self) -> Float;
            pub fn orientation(&self) -> Orientation;
            pub fn translation_precision(&self) -> Float;
            pub fn rotation_precision(&self) -> Float;
            pub fn rotation_matrix(&self) -> Matrix;
            pub fn translation_vector(&self) -> Vector;
            #[allow(clippy::missing_panics_doc)]
            pub fn transformation_matrix(&self) -> Matrix;
            pub fn covariance(&self) -> Matrix;
        }
    }
}
