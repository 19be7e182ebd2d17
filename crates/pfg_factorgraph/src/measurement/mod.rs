//! Measurements between variables.
//!
//! Every measurement validates its invariants when it is constructed and is
//! immutable afterwards, so a value of any of these types is always valid.

mod pose;
mod range;

pub use pose::{AmbiguousPoseMeasurement, PoseMeasurement};
pub use range::{AmbiguousRangeMeasurement, RangeMeasurement};

/// Which association of a range measurement an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum AssociationKind {
    /// The association of a [`RangeMeasurement`]
    Range,
    /// The true association of an [`AmbiguousRangeMeasurement`]
    True,
    /// The measured association of an [`AmbiguousRangeMeasurement`]
    Measured,
}

/// Which precision of a pose measurement an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum PrecisionKind {
    Translation,
    Rotation,
}

/// Error type for measurement construction.
/// There is one variant per invariant, so callers can tell which one failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeasurementError {
    /// An association must name exactly two variables
    #[error("{kind} association must have exactly two variables, got {len}")]
    AssociationArity { kind: AssociationKind, len: usize },
    /// The two variables of an association must differ
    #[error("{kind} association names {name} twice, the variables must be unique")]
    DuplicateAssociation { kind: AssociationKind, name: String },
    /// The first variable of a range association must be a pose
    #[error("first association must be a pose, but {0} is a landmark")]
    PoseKeyExpected(String),
    /// The second variable of a range association must be a landmark
    #[error("second association must be a landmark, but {0} is not")]
    LandmarkKeyExpected(String),
    /// Precisions are reciprocals of variances
    #[error("{kind} precision {value} is not strictly positive and finite")]
    NonPositivePrecision { kind: PrecisionKind, value: f64 },
    /// Translation and rotation disagree on the dimension
    #[error("translation has {translation} components, but the rotation is {rotation}")]
    DimensionMismatch {
        translation: usize,
        rotation:    pfg_geometry::Dimension,
    },
}

/// Result type for measurement construction
pub type Result<T> = std::result::Result<T, MeasurementError>;
