//! Pose and landmark variables.
//!
//! Both are immutable once constructed. The only validation is on shape: the
//! position must have the same dimension as the orientation.

use pfg_geometry::{array, Dimension, Float, Matrix, Orientation, Vector};
use serde::Serialize;

/// Error type for variable construction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VariableError {
    /// Position and orientation disagree on the dimension
    #[error(
        "variable {name}: position has {position} coordinates, but the orientation is \
         {orientation}"
    )]
    DimensionMismatch {
        name:        String,
        position:    usize,
        orientation: Dimension,
    },
    /// Position is neither 2D nor 3D
    #[error("variable {name}: a position with {len} coordinates is neither 2D nor 3D")]
    UnsupportedDimension { name: String, len: usize },
}

/// Result type for variable construction
pub type Result<T> = std::result::Result<T, VariableError>;

/// A robot pose with its ground truth position and orientation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoseVariable {
    name: String,
    #[serde(serialize_with = "pfg_geometry::serialize_vector")]
    true_position: Vector,
    true_orientation: Orientation,
}

impl PoseVariable {
    /// Create a new pose variable.
    ///
    /// # Errors
    ///
    /// Returns [`VariableError::DimensionMismatch`] if `position` does not have
    /// the dimension of `orientation`.
    pub fn new(
        name: impl Into<String>,
        position: Vector,
        orientation: Orientation,
    ) -> Result<Self> {
        let name = name.into();
        if position.len() != orientation.dimension().get() {
            return Err(VariableError::DimensionMismatch {
                name,
                position: position.len(),
                orientation: orientation.dimension(),
            });
        }
        Ok(Self {
            name,
            true_position: position,
            true_orientation: orientation,
        })
    }

    /// Create a planar pose variable.
    #[must_use]
    pub fn new_2d(name: impl Into<String>, (x, y): (Float, Float), theta: Float) -> Self {
        Self {
            name: name.into(),
            true_position: array![x, y],
            true_orientation: Orientation::planar(theta),
        }
    }

    /// Create a spatial pose variable.
    #[must_use]
    pub fn new_3d(
        name: impl Into<String>,
        (x, y, z): (Float, Float, Float),
        (roll, pitch, yaw): (Float, Float, Float),
    ) -> Self {
        Self {
            name: name.into(),
            true_position: array![x, y, z],
            true_orientation: Orientation::spatial(roll, pitch, yaw),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub const fn dimension(&self) -> Dimension {
        self.true_orientation.dimension()
    }

    #[inline]
    pub fn true_x(&self) -> Float {
        self.true_position[0]
    }

    #[inline]
    pub fn true_y(&self) -> Float {
        self.true_position[1]
    }

    /// `None` for planar poses
    #[inline]
    pub fn true_z(&self) -> Option<Float> {
        self.true_position.get(2).copied()
    }

    /// Heading of the pose; `theta` in 2D and `yaw` in 3D
    #[inline]
    pub const fn true_theta(&self) -> Float {
        self.true_orientation.heading()
    }

    #[inline]
    pub const fn true_orientation(&self) -> Orientation {
        self.true_orientation
    }

    #[inline]
    pub const fn position_vector(&self) -> &Vector {
        &self.true_position
    }

    pub fn rotation_matrix(&self) -> Matrix {
        self.true_orientation.rotation_matrix()
    }

    /// Homogeneous transformation of the ground truth pose.
    #[allow(clippy::missing_panics_doc)] // invariant checked in the constructors
    pub fn transformation_matrix(&self) -> Matrix {
        pfg_geometry::transformation_matrix(&self.rotation_matrix(), &self.true_position)
            .expect("position and orientation have the same dimension")
    }
}

/// A stationary landmark, e.g. an acoustic beacon, with its ground truth
/// position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandmarkVariable {
    name: String,
    #[serde(serialize_with = "pfg_geometry::serialize_vector")]
    true_position: Vector,
}

impl LandmarkVariable {
    /// Create a new landmark variable.
    ///
    /// # Errors
    ///
    /// Returns [`VariableError::UnsupportedDimension`] if `position` is not 2D
    /// or 3D.
    pub fn new(name: impl Into<String>, position: Vector) -> Result<Self> {
        let name = name.into();
        if Dimension::try_from(position.len()).is_err() {
            return Err(VariableError::UnsupportedDimension {
                name,
                len: position.len(),
            });
        }
        Ok(Self {
            name,
            true_position: position,
        })
    }

    #[must_use]
    pub fn new_2d(name: impl Into<String>, (x, y): (Float, Float)) -> Self {
        Self {
            name: name.into(),
            true_position: array![x, y],
        }
    }

    #[must_use]
    pub fn new_3d(name: impl Into<String>, (x, y, z): (Float, Float, Float)) -> Self {
        Self {
            name: name.into(),
            true_position: array![x, y, z],
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[allow(clippy::missing_panics_doc)] // invariant checked in the constructors
    pub fn dimension(&self) -> Dimension {
        Dimension::try_from(self.true_position.len()).expect("position is 2D or 3D")
    }

    #[inline]
    pub fn true_x(&self) -> Float {
        self.true_position[0]
    }

    #[inline]
    pub fn true_y(&self) -> Float {
        self.true_position[1]
    }

    #[inline]
    pub fn true_z(&self) -> Option<Float> {
        self.true_position.get(2).copied()
    }

    #[inline]
    pub const fn position_vector(&self) -> &Vector {
        &self.true_position
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn planar_pose_accessors() {
        let pose = PoseVariable::new_2d("A3", (1.0, -2.0), 0.5);
        assert_eq!(pose.name(), "A3");
        assert_eq!(pose.dimension(), Dimension::Two);
        assert_abs_diff_eq!(pose.true_x(), 1.0);
        assert_abs_diff_eq!(pose.true_y(), -2.0);
        assert_eq!(pose.true_z(), None);
        assert_abs_diff_eq!(pose.true_theta(), 0.5);

        let t = pose.transformation_matrix();
        assert_eq!(t.dim(), (3, 3));
        assert_abs_diff_eq!(t[[0, 2]], 1.0);
        assert_abs_diff_eq!(t[[1, 2]], -2.0);
        assert_abs_diff_eq!(t[[1, 0]], 0.5_f64.sin());
    }

    #[test]
    fn spatial_pose_accessors() {
        let pose = PoseVariable::new_3d("B0", (1.0, 2.0, 3.0), (0.0, 0.0, 1.0));
        assert_eq!(pose.dimension(), Dimension::Three);
        assert_eq!(pose.true_z(), Some(3.0));
        assert_abs_diff_eq!(pose.true_theta(), 1.0);
        assert_eq!(pose.transformation_matrix().dim(), (4, 4));
    }

    #[test]
    fn pose_dimension_mismatch() {
        let result = PoseVariable::new("A0", array![1.0, 2.0, 3.0], Orientation::planar(0.0));
        assert_eq!(
            result,
            Err(VariableError::DimensionMismatch {
                name:        "A0".to_string(),
                position:    3,
                orientation: Dimension::Two,
            })
        );
    }

    #[test]
    fn landmark_dimension() {
        let landmark = LandmarkVariable::new("L0", array![1.0, 2.0]).expect("2D position");
        assert_eq!(landmark.dimension(), Dimension::Two);
        assert_eq!(landmark.true_z(), None);

        let landmark = LandmarkVariable::new_3d("L1", (1.0, 2.0, 3.0));
        assert_eq!(landmark.dimension(), Dimension::Three);

        assert_eq!(
            LandmarkVariable::new("L2", array![1.0]),
            Err(VariableError::UnsupportedDimension {
                name: "L2".to_string(),
                len:  1,
            })
        );
    }

    #[test]
    fn serializes_positions_as_sequences() {
        let landmark = LandmarkVariable::new_2d("L0", (1.5, 2.5));
        let json = serde_json::to_value(&landmark).expect("serializable");
        assert_eq!(
            json,
            serde_json::json!({ "name": "L0", "true_position": [1.5, 2.5] })
        );
    }
}
