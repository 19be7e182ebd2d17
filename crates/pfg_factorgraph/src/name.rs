//! Naming conventions for variables.
//!
//! Poses are named by a single alphabetic robot prefix followed by the
//! timestep, e.g. `"A12"`. Landmarks are named `"L"` followed by their index,
//! e.g. `"L3"`. The prefix `L` is therefore reserved and cannot be used for a
//! robot.

use std::str::FromStr;

/// Prefix reserved for landmark names.
pub const LANDMARK_PREFIX: char = 'L';

/// Returns `true` if `name` follows the landmark naming convention.
/// ```
/// use pfg_factorgraph::name::is_landmark_name;
/// assert!(is_landmark_name("L0"));
/// assert!(!is_landmark_name("A0"));
/// ```
#[inline]
#[must_use]
pub fn is_landmark_name(name: &str) -> bool {
    name.starts_with(LANDMARK_PREFIX)
}

/// Name of the pose of robot `robot` at timestep `index`.
#[must_use]
pub fn pose_name(robot: char, index: usize) -> String {
    format!("{robot}{index}")
}

/// Name of the landmark with index `index`.
#[must_use]
pub fn landmark_name(index: usize) -> String {
    format!("{LANDMARK_PREFIX}{index}")
}

/// Error returned by [`VariableName::from_str`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("variable names cannot be empty")]
    Empty,
    #[error("variable name {0:?} does not start with an alphabetic prefix")]
    InvalidPrefix(String),
    #[error("variable name {0:?} does not end with an index")]
    InvalidIndex(String),
}

/// A parsed variable name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum VariableName {
    /// Pose of robot `robot` at timestep `index`
    #[display(fmt = "{}{}", robot, index)]
    Pose { robot: char, index: usize },
    /// Landmark number `index`
    #[display(fmt = "L{}", index)]
    Landmark { index: usize },
}

impl VariableName {
    #[must_use]
    pub const fn index(&self) -> usize {
        match *self {
            Self::Pose { index, .. } | Self::Landmark { index } => index,
        }
    }

    #[must_use]
    pub const fn is_landmark(&self) -> bool {
        matches!(self, Self::Landmark { .. })
    }
}

impl FromStr for VariableName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let Some(prefix) = chars.next() else {
            return Err(NameError::Empty);
        };
        if !prefix.is_ascii_alphabetic() {
            return Err(NameError::InvalidPrefix(s.to_string()));
        }
        let index = chars
            .as_str()
            .parse::<usize>()
            .map_err(|_| NameError::InvalidIndex(s.to_string()))?;

        Ok(if prefix == LANDMARK_PREFIX {
            Self::Landmark { index }
        } else {
            Self::Pose {
                robot: prefix,
                index,
            }
        })
    }
}
