//! The factor graph aggregate.
//!
//! A [`FactorGraph`] owns every variable and measurement of one estimation
//! problem. It is only mutated through its `add_*` methods, which check
//! that every identifier a measurement refers to names a variable already in
//! the graph. [`FactorGraph::finalize`] consumes the graph and returns a
//! [`FinalizedFactorGraph`] that can only be read.

use std::collections::HashMap;

use indexmap::IndexMap;
use pfg_geometry::Dimension;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    measurement::{
        AmbiguousPoseMeasurement, AmbiguousRangeMeasurement, PoseMeasurement, RangeMeasurement,
    },
    name::is_landmark_name,
    variable::{LandmarkVariable, PoseVariable},
};

/// The role a variable plays in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum VariableRole {
    Pose,
    Landmark,
}

/// The kind of measurement an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum MeasurementKind {
    Odometry,
    LoopClosure,
    AmbiguousLoopClosure,
    Range,
    AmbiguousRange,
}

/// Error type for mutations of a [`FactorGraph`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FactorGraphError {
    /// A measurement refers to a variable that has not been added
    #[error("{kind} measurement refers to unknown variable {name}")]
    UnknownVariable { name: String, kind: MeasurementKind },
    /// A variable with the same name is already in the graph
    #[error("variable {0} is already in the graph")]
    DuplicateVariable(String),
    /// The name of a variable does not follow the convention of its role
    #[error("{name} is not a valid {expected} name")]
    RoleMismatch { name: String, expected: VariableRole },
    /// A variable or measurement does not have the dimension of the graph
    #[error("{name} is {found}, but the graph is {expected}")]
    DimensionMismatch {
        name:     String,
        expected: Dimension,
        found:    Dimension,
    },
}

/// Result type for mutations of a [`FactorGraph`]
pub type Result<T> = std::result::Result<T, FactorGraphError>;

/// Lifecycle of a factor graph.
///
/// ```text
/// Empty --add_*--> Populating --finalize--> Finalized
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum GraphState {
    /// Nothing has been added yet
    Empty,
    /// At least one variable or measurement has been added
    Populating,
    /// The graph has been finalized and can no longer be mutated
    Finalized,
}

/// Factor graph of a multi-robot pose graph problem.
///
/// **Invariants**:
/// - variable names are unique across poses and landmarks
/// - every variable has the dimension of the graph
/// - every identifier referenced by a measurement names a variable in the
///   graph
#[derive(Debug, Clone, Serialize)]
pub struct FactorGraph {
    dimension: Dimension,
    /// Trajectory of each robot, in insertion order
    pose_variables: Vec<Vec<PoseVariable>>,
    /// Pose name -> (robot, position in trajectory)
    #[serde(skip)]
    pose_lookup: HashMap<String, (usize, usize)>,
    /// Insertion ordered for deterministic export
    landmark_variables: IndexMap<String, LandmarkVariable>,
    /// Odometry of each robot, in insertion order
    odom_measurements: Vec<Vec<PoseMeasurement>>,
    loop_closure_measurements: Vec<PoseMeasurement>,
    ambiguous_loop_closure_measurements: Vec<AmbiguousPoseMeasurement>,
    range_measurements: Vec<RangeMeasurement>,
    ambiguous_range_measurements: Vec<AmbiguousRangeMeasurement>,
}

impl Default for FactorGraph {
    fn default() -> Self {
        Self::new(Dimension::default())
    }
}

impl FactorGraph {
    /// Construct a new empty factor graph of the given dimension
    #[must_use]
    pub fn new(dimension: Dimension) -> Self {
        Self {
            dimension,
            pose_variables: Vec::new(),
            pose_lookup: HashMap::new(),
            landmark_variables: IndexMap::new(),
            odom_measurements: Vec::new(),
            loop_closure_measurements: Vec::new(),
            ambiguous_loop_closure_measurements: Vec::new(),
            range_measurements: Vec::new(),
            ambiguous_range_measurements: Vec::new(),
        }
    }

    #[inline]
    pub const fn dimension(&self) -> Dimension {
        self.dimension
    }

    fn check_dimension(&self, name: &str, found: Dimension) -> Result<()> {
        if found == self.dimension {
            Ok(())
        } else {
            Err(FactorGraphError::DimensionMismatch {
                name: name.to_string(),
                expected: self.dimension,
                found,
            })
        }
    }

    fn check_unique(&self, name: &str) -> Result<()> {
        if self.pose_exists(name) || self.landmark_exists(name) {
            Err(FactorGraphError::DuplicateVariable(name.to_string()))
        } else {
            Ok(())
        }
    }

    fn require_pose(&self, name: &str, kind: MeasurementKind) -> Result<()> {
        if self.pose_exists(name) {
            Ok(())
        } else {
            Err(FactorGraphError::UnknownVariable {
                name: name.to_string(),
                kind,
            })
        }
    }

    fn require_landmark(&self, name: &str, kind: MeasurementKind) -> Result<()> {
        if self.landmark_exists(name) {
            Ok(())
        } else {
            Err(FactorGraphError::UnknownVariable {
                name: name.to_string(),
                kind,
            })
        }
    }

    fn require_variable(&self, name: &str, kind: MeasurementKind) -> Result<()> {
        if self.pose_exists(name) || self.landmark_exists(name) {
            Ok(())
        } else {
            Err(FactorGraphError::UnknownVariable {
                name: name.to_string(),
                kind,
            })
        }
    }

    /// Append a pose to the trajectory of robot `robot`.
    /// Trajectories are created on demand.
    ///
    /// # Errors
    ///
    /// - [`FactorGraphError::RoleMismatch`] if the name is a landmark name
    /// - [`FactorGraphError::DuplicateVariable`] if the name is taken
    /// - [`FactorGraphError::DimensionMismatch`] if the pose does not have the
    ///   dimension of the graph
    pub fn add_pose_variable(&mut self, robot: usize, pose: PoseVariable) -> Result<()> {
        if is_landmark_name(pose.name()) {
            return Err(FactorGraphError::RoleMismatch {
                name:     pose.name().to_string(),
                expected: VariableRole::Pose,
            });
        }
        self.check_unique(pose.name())?;
        self.check_dimension(pose.name(), pose.dimension())?;

        if self.pose_variables.len() <= robot {
            self.pose_variables.resize_with(robot + 1, Vec::new);
        }
        let trajectory = &mut self.pose_variables[robot];
        debug!("adding pose {} to trajectory of robot {}", pose.name(), robot);
        self.pose_lookup
            .insert(pose.name().to_string(), (robot, trajectory.len()));
        trajectory.push(pose);
        Ok(())
    }

    /// Add a landmark to the graph.
    ///
    /// # Errors
    ///
    /// - [`FactorGraphError::RoleMismatch`] if the name is not a landmark name
    /// - [`FactorGraphError::DuplicateVariable`] if the name is taken
    /// - [`FactorGraphError::DimensionMismatch`] if the landmark does not have
    ///   the dimension of the graph
    pub fn add_landmark_variable(&mut self, landmark: LandmarkVariable) -> Result<()> {
        if !is_landmark_name(landmark.name()) {
            return Err(FactorGraphError::RoleMismatch {
                name:     landmark.name().to_string(),
                expected: VariableRole::Landmark,
            });
        }
        self.check_unique(landmark.name())?;
        self.check_dimension(landmark.name(), landmark.dimension())?;

        debug!("adding landmark {}", landmark.name());
        self.landmark_variables
            .insert(landmark.name().to_string(), landmark);
        Ok(())
    }

    fn check_pose_measurement(
        &self,
        measurement: &PoseMeasurement,
        kind: MeasurementKind,
    ) -> Result<()> {
        self.require_pose(measurement.base_pose(), kind)?;
        self.require_pose(measurement.to_pose(), kind)?;
        self.check_dimension(
            &format!("{} -> {}", measurement.base_pose(), measurement.to_pose()),
            measurement.dimension(),
        )
    }

    /// Add an odometry measurement of robot `robot`.
    ///
    /// # Errors
    ///
    /// - [`FactorGraphError::UnknownVariable`] if either pose is not in the
    ///   graph
    /// - [`FactorGraphError::DimensionMismatch`] if the measurement does not
    ///   have the dimension of the graph
    pub fn add_odom_measurement(&mut self, robot: usize, odom: PoseMeasurement) -> Result<()> {
        self.check_pose_measurement(&odom, MeasurementKind::Odometry)?;
        if self.odom_measurements.len() <= robot {
            self.odom_measurements.resize_with(robot + 1, Vec::new);
        }
        debug!(
            "adding odometry {} -> {} of robot {}",
            odom.base_pose(),
            odom.to_pose(),
            robot
        );
        self.odom_measurements[robot].push(odom);
        Ok(())
    }

    /// Add a loop closure between two poses, possibly of different robots.
    ///
    /// # Errors
    ///
    /// See [`FactorGraph::add_odom_measurement`]
    pub fn add_loop_closure(&mut self, loop_closure: PoseMeasurement) -> Result<()> {
        self.check_pose_measurement(&loop_closure, MeasurementKind::LoopClosure)?;
        debug!(
            "adding loop closure {} -> {}",
            loop_closure.base_pose(),
            loop_closure.to_pose()
        );
        self.loop_closure_measurements.push(loop_closure);
        Ok(())
    }

    /// Add a loop closure whose target pose may be misassociated.
    ///
    /// # Errors
    ///
    /// - [`FactorGraphError::UnknownVariable`] if any of the three poses is
    ///   not in the graph
    /// - [`FactorGraphError::DimensionMismatch`] if the measurement does not
    ///   have the dimension of the graph
    pub fn add_ambiguous_loop_closure(
        &mut self,
        loop_closure: AmbiguousPoseMeasurement,
    ) -> Result<()> {
        let kind = MeasurementKind::AmbiguousLoopClosure;
        self.require_pose(loop_closure.base_pose(), kind)?;
        self.require_pose(loop_closure.measured_to_pose(), kind)?;
        self.require_pose(loop_closure.true_to_pose(), kind)?;
        self.check_dimension(
            &format!(
                "{} -> {}",
                loop_closure.base_pose(),
                loop_closure.measured_to_pose()
            ),
            loop_closure.dimension(),
        )?;
        debug!(
            "adding ambiguous loop closure {} -> {} (true {})",
            loop_closure.base_pose(),
            loop_closure.measured_to_pose(),
            loop_closure.true_to_pose()
        );
        self.ambiguous_loop_closure_measurements.push(loop_closure);
        Ok(())
    }

    /// Add a range measurement between a pose and a landmark.
    ///
    /// # Errors
    ///
    /// Returns [`FactorGraphError::UnknownVariable`] if the pose or the
    /// landmark is not in the graph.
    pub fn add_range_measurement(&mut self, range: RangeMeasurement) -> Result<()> {
        self.require_pose(range.pose_key(), MeasurementKind::Range)?;
        self.require_landmark(range.landmark_key(), MeasurementKind::Range)?;
        debug!(
            "adding range {} -> {}: {}",
            range.pose_key(),
            range.landmark_key(),
            range.dist()
        );
        self.range_measurements.push(range);
        Ok(())
    }

    /// Add a range measurement whose association may be wrong.
    /// The associations carry no role, so only existence is checked.
    ///
    /// # Errors
    ///
    /// Returns [`FactorGraphError::UnknownVariable`] if any of the referenced
    /// variables is not in the graph.
    pub fn add_ambiguous_range_measurement(
        &mut self,
        range: AmbiguousRangeMeasurement,
    ) -> Result<()> {
        let kind = MeasurementKind::AmbiguousRange;
        let (true_a, true_b) = range.true_association();
        let (measured_a, measured_b) = range.measured_association();
        for name in [true_a, true_b, measured_a, measured_b] {
            self.require_variable(name, kind)?;
        }
        debug!("adding ambiguous range {measured_a} -> {measured_b}");
        self.ambiguous_range_measurements.push(range);
        Ok(())
    }

    /// Total number of poses across all robots
    pub fn num_poses(&self) -> usize {
        self.pose_variables.iter().map(Vec::len).sum()
    }

    #[inline]
    pub fn num_landmarks(&self) -> usize {
        self.landmark_variables.len()
    }

    /// Number of robot trajectories, including empty ones created by adding a
    /// pose to a higher robot index
    #[inline]
    pub fn num_robots(&self) -> usize {
        self.pose_variables.len()
    }

    /// Poses of robot `robot`, in the order they were added.
    /// Empty if the robot has no trajectory.
    pub fn pose_trajectory(&self, robot: usize) -> &[PoseVariable] {
        self.pose_variables.get(robot).map_or(&[][..], Vec::as_slice)
    }

    #[inline]
    pub fn pose_variables(&self) -> &[Vec<PoseVariable>] {
        &self.pose_variables
    }

    /// Landmarks in insertion order
    pub fn landmark_variables(&self) -> impl Iterator<Item = &LandmarkVariable> {
        self.landmark_variables.values()
    }

    pub fn landmark(&self, name: &str) -> Option<&LandmarkVariable> {
        self.landmark_variables.get(name)
    }

    pub fn pose(&self, name: &str) -> Option<&PoseVariable> {
        self.pose_lookup
            .get(name)
            .map(|&(robot, index)| &self.pose_variables[robot][index])
    }

    pub fn pose_exists(&self, name: &str) -> bool {
        self.pose_lookup.contains_key(name)
    }

    pub fn landmark_exists(&self, name: &str) -> bool {
        self.landmark_variables.contains_key(name)
    }

    /// Odometry of robot `robot`, in the order it was added
    pub fn odom_measurements(&self, robot: usize) -> &[PoseMeasurement] {
        self.odom_measurements.get(robot).map_or(&[][..], Vec::as_slice)
    }

    /// Odometry of every robot, robot by robot
    pub fn all_odom_measurements(&self) -> impl Iterator<Item = &PoseMeasurement> {
        self.odom_measurements.iter().flatten()
    }

    #[inline]
    pub fn loop_closures(&self) -> &[PoseMeasurement] {
        &self.loop_closure_measurements
    }

    #[inline]
    pub fn ambiguous_loop_closures(&self) -> &[AmbiguousPoseMeasurement] {
        &self.ambiguous_loop_closure_measurements
    }

    #[inline]
    pub fn range_measurements(&self) -> &[RangeMeasurement] {
        &self.range_measurements
    }

    #[inline]
    pub fn ambiguous_range_measurements(&self) -> &[AmbiguousRangeMeasurement] {
        &self.ambiguous_range_measurements
    }

    /// `true` if neither variables nor measurements have been added
    pub fn is_empty(&self) -> bool {
        self.pose_lookup.is_empty()
            && self.landmark_variables.is_empty()
            && self.odom_measurements.iter().all(Vec::is_empty)
            && self.loop_closure_measurements.is_empty()
            && self.ambiguous_loop_closure_measurements.is_empty()
            && self.range_measurements.is_empty()
            && self.ambiguous_range_measurements.is_empty()
    }

    /// State of a graph that can still be mutated.
    /// A [`FinalizedFactorGraph`] reports [`GraphState::Finalized`].
    pub fn state(&self) -> GraphState {
        if self.is_empty() {
            GraphState::Empty
        } else {
            GraphState::Populating
        }
    }

    /// Freeze the graph. There is no way back.
    #[must_use]
    pub fn finalize(self) -> FinalizedFactorGraph {
        info!(
            "finalizing factor graph: {} poses, {} landmarks, {} odometry, {} ranges",
            self.num_poses(),
            self.num_landmarks(),
            self.all_odom_measurements().count(),
            self.range_measurements.len()
        );
        FinalizedFactorGraph(self)
    }
}

/// A factor graph that can no longer be mutated.
///
/// Derefs to [`FactorGraph`] for read access only.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct FinalizedFactorGraph(FactorGraph);

impl FinalizedFactorGraph {
    #[inline]
    pub const fn state(&self) -> GraphState {
        GraphState::Finalized
    }
}

impl std::ops::Deref for FinalizedFactorGraph {
    type Target = FactorGraph;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
