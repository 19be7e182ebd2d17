use pfg_geometry::Float;
use serde::Serialize;

use super::{AssociationKind, MeasurementError, Result};
use crate::name::is_landmark_name;

/// Check that an association names exactly two distinct variables.
fn unique_pair<I, S>(kind: AssociationKind, association: I) -> Result<(String, String)>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut names: Vec<String> = association.into_iter().map(Into::into).collect();
    if names.len() != 2 {
        return Err(MeasurementError::AssociationArity {
            kind,
            len: names.len(),
        });
    }
    let second = names.pop().unwrap_or_default();
    let first = names.pop().unwrap_or_default();
    if first == second {
        return Err(MeasurementError::DuplicateAssociation { kind, name: first });
    }
    Ok((first, second))
}

#[inline]
fn weight(stddev: Float) -> Float {
    1.0 / (stddev * stddev)
}

/// A range measurement from a pose to a landmark.
///
/// **Invariants**:
/// - the association names exactly two distinct variables
/// - the first is a pose, the second a landmark
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeMeasurement {
    association: (String, String),
    dist:        Float,
    stddev:      Float,
}

impl RangeMeasurement {
    /// Create a new range measurement.
    ///
    /// # Errors
    ///
    /// - [`MeasurementError::AssociationArity`] if `association` does not have
    ///   exactly two elements.
    /// - [`MeasurementError::DuplicateAssociation`] if both elements are equal.
    /// - [`MeasurementError::PoseKeyExpected`] if the first element is a
    ///   landmark.
    /// - [`MeasurementError::LandmarkKeyExpected`] if the second element is not
    ///   a landmark.
    pub fn new<I, S>(association: I, dist: Float, stddev: Float) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (pose, landmark) = unique_pair(AssociationKind::Range, association)?;
        if is_landmark_name(&pose) {
            return Err(MeasurementError::PoseKeyExpected(pose));
        }
        if !is_landmark_name(&landmark) {
            return Err(MeasurementError::LandmarkKeyExpected(landmark));
        }
        Ok(Self {
            association: (pose, landmark),
            dist,
            stddev,
        })
    }

    #[inline]
    pub fn association(&self) -> (&str, &str) {
        (&self.association.0, &self.association.1)
    }

    #[inline]
    pub fn pose_key(&self) -> &str {
        &self.association.0
    }

    #[inline]
    pub fn landmark_key(&self) -> &str {
        &self.association.1
    }

    #[inline]
    pub const fn dist(&self) -> Float {
        self.dist
    }

    #[inline]
    pub const fn stddev(&self) -> Float {
        self.stddev
    }

    /// `1 / stddev²`
    #[inline]
    pub fn weight(&self) -> Float {
        weight(self.stddev)
    }
}

/// A range measurement whose data association may be wrong.
///
/// Unlike [`RangeMeasurement`] the associations carry no pose/landmark role
/// constraint, only that each names two distinct variables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmbiguousRangeMeasurement {
    true_association:     (String, String),
    measured_association: (String, String),
    dist:                 Float,
    stddev:               Float,
}

impl AmbiguousRangeMeasurement {
    /// Create a new ambiguous range measurement.
    ///
    /// # Errors
    ///
    /// - [`MeasurementError::AssociationArity`] if either association does not
    ///   have exactly two elements.
    /// - [`MeasurementError::DuplicateAssociation`] if either association names
    ///   the same variable twice.
    pub fn new<I, J, S, T>(
        true_association: I,
        measured_association: J,
        dist: Float,
        stddev: Float,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Ok(Self {
            true_association: unique_pair(AssociationKind::True, true_association)?,
            measured_association: unique_pair(AssociationKind::Measured, measured_association)?,
            dist,
            stddev,
        })
    }

    #[inline]
    pub fn true_association(&self) -> (&str, &str) {
        (&self.true_association.0, &self.true_association.1)
    }

    #[inline]
    pub fn measured_association(&self) -> (&str, &str) {
        (&self.measured_association.0, &self.measured_association.1)
    }

    #[inline]
    pub const fn dist(&self) -> Float {
        self.dist
    }

    #[inline]
    pub const fn stddev(&self) -> Float {
        self.stddev
    }

    /// `1 / stddev²`
    #[inline]
    pub fn weight(&self) -> Float {
        weight(self.stddev)
    }
}
