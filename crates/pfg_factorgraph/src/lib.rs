//! Data model of a multi-robot pose graph.
//!
//! Variables (robot poses and landmarks) and the measurements between them
//! are immutable values that check their invariants on construction. A
//! [`FactorGraph`] collects them and checks that every measurement refers to
//! variables it already knows.

pub mod draw;
pub mod factorgraph;
pub mod measurement;
pub mod name;
pub mod variable;

pub use factorgraph::{FactorGraph, FactorGraphError, FinalizedFactorGraph, GraphState};
pub use measurement::{
    AmbiguousPoseMeasurement, AmbiguousRangeMeasurement, MeasurementError, PoseMeasurement,
    RangeMeasurement,
};
pub use variable::{LandmarkVariable, PoseVariable, VariableError};

/// prelude module bringing the commonly used types into scope
pub mod prelude {
    pub use super::{
        factorgraph::{FactorGraph, FactorGraphError, FinalizedFactorGraph, GraphState},
        measurement::{
            AmbiguousPoseMeasurement, AmbiguousRangeMeasurement, MeasurementError,
            PoseMeasurement, RangeMeasurement,
        },
        name::{is_landmark_name, landmark_name, pose_name, VariableName},
        variable::{LandmarkVariable, PoseVariable, VariableError},
    };
}
