//! Renderer agnostic draw primitives for a factor graph.
//!
//! Nothing in here draws anything. The functions turn variables and
//! measurements into plain shapes in the xy plane, which a plotting front-end
//! can render however it likes. Spatial graphs are projected onto the xy
//! plane, with the heading taken from the yaw.

use pfg_geometry::{angle_from_rotation_matrix, split_transformation, Float, Matrix};
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::{
    factorgraph::FactorGraph,
    measurement::RangeMeasurement,
    name::VariableName,
    variable::{LandmarkVariable, PoseVariable},
};

/// Length of the arrow drawn for a pose
pub const QUIVER_LENGTH: Float = 0.1;
/// Width of the shaft of the arrow drawn for a pose
pub const QUIVER_WIDTH: Float = 0.01;

/// Colors used to tell robots and landmarks apart.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    strum_macros::EnumIter,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Color {
    #[default]
    Blue,
    Red,
    Green,
    Yellow,
    Black,
    Cyan,
    Magenta,
}

impl Color {
    /// The `i`th color, wrapping around when `i` exceeds the number of
    /// colors.
    /// ```
    /// use pfg_factorgraph::draw::Color;
    /// assert_eq!(Color::cycle(0), Color::Blue);
    /// assert_eq!(Color::cycle(7), Color::Blue);
    /// assert_eq!(Color::cycle(8), Color::Red);
    /// ```
    #[must_use]
    pub fn cycle(i: usize) -> Self {
        let n = Self::iter().count();
        Self::iter().nth(i % n).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Arrow {
    pub x:           Float,
    pub y:           Float,
    pub dx:          Float,
    pub dy:          Float,
    pub head_width:  Float,
    pub head_length: Float,
    pub width:       Float,
    pub color:       Color,
}

impl Arrow {
    /// Arrow of length [`QUIVER_LENGTH`] at `(x, y)` pointing along `theta`.
    #[must_use]
    pub fn new(x: Float, y: Float, theta: Float, color: Color) -> Self {
        Self {
            x,
            y,
            dx: QUIVER_LENGTH * theta.cos(),
            dy: QUIVER_LENGTH * theta.sin(),
            head_width: QUIVER_LENGTH,
            head_length: QUIVER_LENGTH,
            width: QUIVER_WIDTH,
            color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Line {
    pub start: [Float; 2],
    pub end:   [Float; 2],
    pub color: Color,
}

/// Unfilled circle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Circle {
    pub center: [Float; 2],
    pub radius: Float,
    pub color:  Color,
}

/// Star shaped scatter marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Marker {
    pub position: [Float; 2],
    pub color:    Color,
}

/// Any of the shapes above.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, derive_more::From)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Primitive {
    Arrow(Arrow),
    Line(Line),
    Circle(Circle),
    Marker(Marker),
}

/// Arrow at the ground truth pose.
#[must_use]
pub fn pose_arrow(pose: &PoseVariable, color: Color) -> Arrow {
    Arrow::new(pose.true_x(), pose.true_y(), pose.true_theta(), color)
}

/// Arrow at the pose described by a homogeneous transformation.
///
/// # Errors
///
/// Returns [`pfg_geometry::GeometryError::NotHomogeneous`] if `pose` is not
/// 3x3 or 4x4.
pub fn pose_matrix_arrow(pose: &Matrix, color: Color) -> pfg_geometry::Result<Arrow> {
    let (rotation, translation) = split_transformation(pose)?;
    let theta = angle_from_rotation_matrix(&rotation)?;
    Ok(Arrow::new(translation[0], translation[1], theta, color))
}

#[must_use]
pub fn landmark_marker(landmark: &LandmarkVariable) -> Marker {
    Marker {
        position: [landmark.true_x(), landmark.true_y()],
        color:    Color::Green,
    }
}

/// Line from `base` to the target pose of a loop closure, and an arrow at
/// the target.
#[must_use]
pub fn loop_closure_primitives(base: [Float; 2], to_pose: &PoseVariable) -> (Line, Arrow) {
    let line = Line {
        start: base,
        end:   [to_pose.true_x(), to_pose.true_y()],
        color: Color::Green,
    };
    (line, pose_arrow(to_pose, Color::default()))
}

/// Line from the pose to the landmark, and a circle around the pose with the
/// measured distance as radius. Colored by the landmark index.
#[must_use]
pub fn range_primitives(
    range: &RangeMeasurement,
    from_pose: &PoseVariable,
    to_landmark: &LandmarkVariable,
) -> (Line, Circle) {
    let color = to_landmark
        .name()
        .parse::<VariableName>()
        .map_or_else(|_| Color::default(), |name| Color::cycle(name.index()));
    let start = [from_pose.true_x(), from_pose.true_y()];
    let line = Line {
        start,
        end: [to_landmark.true_x(), to_landmark.true_y()],
        color,
    };
    let circle = Circle {
        center: start,
        radius: range.dist(),
        color,
    };
    (line, circle)
}

impl FactorGraph {
    /// Every primitive needed to draw the graph:
    /// - an arrow per pose, colored by robot
    /// - a marker per landmark
    /// - a line and an arrow per loop closure
    /// - a line and a circle per range measurement
    pub fn draw_primitives(&self) -> Vec<Primitive> {
        let mut primitives: Vec<Primitive> = self
            .pose_variables()
            .iter()
            .enumerate()
            .flat_map(|(robot, trajectory)| {
                let color = Color::cycle(robot);
                trajectory
                    .iter()
                    .map(move |pose| Primitive::from(pose_arrow(pose, color)))
            })
            .collect();

        primitives.extend(self.landmark_variables().map(|l| Primitive::from(landmark_marker(l))));

        for loop_closure in self.loop_closures() {
            let (Some(base), Some(to)) = (
                self.pose(loop_closure.base_pose()),
                self.pose(loop_closure.to_pose()),
            ) else {
                continue;
            };
            let (line, arrow) = loop_closure_primitives([base.true_x(), base.true_y()], to);
            primitives.push(line.into());
            primitives.push(arrow.into());
        }

        for range in self.range_measurements() {
            let (Some(pose), Some(landmark)) =
                (self.pose(range.pose_key()), self.landmark(range.landmark_key()))
            else {
                continue;
            };
            let (line, circle) = range_primitives(range, pose, landmark);
            primitives.push(line.into());
            primitives.push(circle.into());
        }

        primitives
    }
}
