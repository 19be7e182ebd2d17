//! Configuration of the conversion of a GOATS dataset into a pose graph.
//!
//! Every section has a default matching the GOATS recordings, so an empty
//! file, or no file at all, is a valid configuration.

pub mod reader;

use pfg_geometry::{Dimension, Float};
pub use reader::{read_config, ConfigReaderError};
use serde::{Deserialize, Serialize};
use typed_floats::StrictlyPositiveFinite;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(#[from] ValidationError),
}

/// Constraints between fields that serde cannot express.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("range bounds [{min}, {max}] must be finite, non-negative and ordered")]
    RangeBounds { min: Float, max: Float },
    #[error("robot prefix {0:?} must be an ASCII letter other than 'L'")]
    RobotPrefix(char),
    #[error("column {0} must not be empty")]
    EmptyColumn(&'static str),
    #[error("range prefixes must differ, both are {0:?}")]
    SameRangePrefix(String),
}

/// **Dataset section:**
/// How to read the dataset and how to name the variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DatasetSection {
    /// 2 or 3
    pub dimension:     Dimension,
    /// Use the outlier filtered range columns instead of the raw ones
    pub filter_ranges: bool,
    /// Poses are named `<robot-prefix><row>`
    pub robot_prefix:  char,
    /// Trajectory the poses are added to
    pub robot_index:   usize,
}

impl Default for DatasetSection {
    fn default() -> Self {
        Self {
            dimension:     Dimension::Two,
            filter_ranges: true,
            robot_prefix:  'A',
            robot_index:   0,
        }
    }
}

/// **Odometry section:**
/// Noise model of the odometry derived from the INS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OdometrySection {
    /// SI unit: m²
    pub translation_covariance: StrictlyPositiveFinite<Float>,
    /// SI unit: rad²
    pub rotation_covariance:    StrictlyPositiveFinite<Float>,
}

impl Default for OdometrySection {
    fn default() -> Self {
        Self {
            translation_covariance: (0.02 * 0.02).try_into().expect("0.02² > 0.0"),
            rotation_covariance:    (0.002 * 0.002).try_into().expect("0.002² > 0.0"),
        }
    }
}

/// What to do with range readings outside `[min-range, max-range]`.
/// They are always reported.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RangeBoundsPolicy {
    #[default]
    Keep,
    Exclude,
}

/// **Range section:**
/// Noise model and plausibility bounds of the acoustic ranges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RangeSection {
    /// SI unit: m
    pub stddev:        StrictlyPositiveFinite<Float>,
    /// SI unit: m
    pub min_range:     Float,
    /// SI unit: m
    pub max_range:     Float,
    pub bounds_policy: RangeBoundsPolicy,
}

impl RangeSection {
    /// `true` if `dist` lies within `[min_range, max_range]`
    #[must_use]
    pub fn in_bounds(&self, dist: Float) -> bool {
        (self.min_range..=self.max_range).contains(&dist)
    }
}

impl Default for RangeSection {
    fn default() -> Self {
        Self {
            stddev:        0.75.try_into().expect("0.75 > 0.0"),
            min_range:     2.0,
            max_range:     150.0,
            bounds_policy: RangeBoundsPolicy::Keep,
        }
    }
}

/// **Columns section:**
/// Names of the columns in the sensor table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ColumnSection {
    pub x_pos:    String,
    pub y_pos:    String,
    pub z_pos:    String,
    pub x_pos_gt: String,
    pub y_pos_gt: String,
    pub z_pos_gt: String,
    pub roll:     String,
    pub pitch:    String,
    pub yaw:      String,
    pub x_vel:    String,
    pub y_vel:    String,
    pub z_vel:    String,
    /// Range to beacon `i` is in column `<range-prefix><i + 1>`
    pub range_prefix: String,
    /// Outlier filtered range to beacon `i` is in column
    /// `<filtered-range-prefix><i + 1>`
    pub filtered_range_prefix: String,
}

impl Default for ColumnSection {
    fn default() -> Self {
        Self {
            x_pos:    "insXYZ_1".to_string(),
            y_pos:    "insXYZ_2".to_string(),
            z_pos:    "insXYZ_3".to_string(),
            x_pos_gt: "iNav_GT_1".to_string(),
            y_pos_gt: "iNav_GT_2".to_string(),
            z_pos_gt: "iNav_GT_3".to_string(),
            roll:     "insRPY_1".to_string(),
            pitch:    "insRPY_2".to_string(),
            yaw:      "insRPY_3".to_string(),
            x_vel:    "insVel_1".to_string(),
            y_vel:    "insVel_2".to_string(),
            z_vel:    "insVel_3".to_string(),
            range_prefix: "ranges_".to_string(),
            filtered_range_prefix: "filtered_ranges_".to_string(),
        }
    }
}

impl ColumnSection {
    /// INS position columns, `z` only in 3D
    #[must_use]
    pub fn position_columns(&self, dimension: Dimension) -> Vec<&str> {
        let all = [self.x_pos.as_str(), self.y_pos.as_str(), self.z_pos.as_str()];
        all[..dimension.get()].to_vec()
    }

    /// Ground truth position columns, `z` only in 3D
    #[must_use]
    pub fn gt_position_columns(&self, dimension: Dimension) -> Vec<&str> {
        let all = [self.x_pos_gt.as_str(), self.y_pos_gt.as_str(), self.z_pos_gt.as_str()];
        all[..dimension.get()].to_vec()
    }

    /// `[yaw]` in 2D, `[roll, pitch, yaw]` in 3D
    #[must_use]
    pub fn rotation_columns(&self, dimension: Dimension) -> Vec<&str> {
        match dimension {
            Dimension::Two => vec![self.yaw.as_str()],
            Dimension::Three => vec![self.roll.as_str(), self.pitch.as_str(), self.yaw.as_str()],
        }
    }

    /// Velocity columns, `z` only in 3D
    #[must_use]
    pub fn velocity_columns(&self, dimension: Dimension) -> Vec<&str> {
        let all = [self.x_vel.as_str(), self.y_vel.as_str(), self.z_vel.as_str()];
        all[..dimension.get()].to_vec()
    }

    /// Every state column that must be present for a dataset of `dimension`
    #[must_use]
    pub fn state_columns(&self, dimension: Dimension) -> Vec<&str> {
        let mut columns = self.position_columns(dimension);
        columns.extend(self.gt_position_columns(dimension));
        columns.extend(self.rotation_columns(dimension));
        columns.extend(self.velocity_columns(dimension));
        columns
    }

    /// Range column of beacon `beacon`, counting from zero
    /// ```
    /// use pfg_config::ColumnSection;
    /// let columns = ColumnSection::default();
    /// assert_eq!(columns.range_column(0, false), "ranges_1");
    /// assert_eq!(columns.range_column(3, true), "filtered_ranges_4");
    /// ```
    #[must_use]
    pub fn range_column(&self, beacon: usize, filtered: bool) -> String {
        let prefix = if filtered {
            &self.filtered_range_prefix
        } else {
            &self.range_prefix
        };
        format!("{prefix}{}", beacon + 1)
    }

    /// `true` if `column` is a raw range column
    #[must_use]
    pub fn is_raw_range_column(&self, column: &str) -> bool {
        column.starts_with(&self.range_prefix) && !column.starts_with(&self.filtered_range_prefix)
    }

    /// `true` if `column` is a filtered range column
    #[must_use]
    pub fn is_filtered_range_column(&self, column: &str) -> bool {
        column.starts_with(&self.filtered_range_prefix)
    }
}

/// Collection of all the sections in the config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// **Dataset section:**
    #[serde(default)]
    pub dataset:  DatasetSection,
    /// **Odometry section:**
    #[serde(default)]
    pub odometry: OdometrySection,
    /// **Range section:**
    #[serde(default)]
    pub range:    RangeSection,
    /// **Columns section:**
    #[serde(default)]
    pub columns:  ColumnSection,
}

impl Config {
    /// Parse a config file from a given path
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the file cannot be read, parsed or
    /// validated.
    pub fn from_file<P>(path: P) -> Result<Self, ParseError>
    where
        P: AsRef<std::path::Path>,
    {
        std::fs::read_to_string(path)
            .map_err(Into::into)
            .and_then(|contents| Self::parse(contents.as_str()))
    }

    /// Parse and validate a config
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the contents cannot be parsed or validated.
    pub fn parse(contents: &str) -> Result<Self, ParseError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the constraints between fields.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let RangeSection {
            min_range,
            max_range,
            ..
        } = self.range;
        let ordered = min_range.is_finite()
            && max_range.is_finite()
            && 0.0 <= min_range
            && min_range <= max_range;
        if !ordered {
            return Err(ValidationError::RangeBounds {
                min: min_range,
                max: max_range,
            });
        }

        let prefix = self.dataset.robot_prefix;
        if !prefix.is_ascii_alphabetic() || prefix == 'L' {
            return Err(ValidationError::RobotPrefix(prefix));
        }

        if self.columns.range_prefix.is_empty() {
            return Err(ValidationError::EmptyColumn("range-prefix"));
        }
        if self.columns.filtered_range_prefix.is_empty() {
            return Err(ValidationError::EmptyColumn("filtered-range-prefix"));
        }
        if self.columns.range_prefix == self.columns.filtered_range_prefix {
            return Err(ValidationError::SameRangePrefix(
                self.columns.range_prefix.clone(),
            ));
        }

        Ok(())
    }

    /// Range column of beacon `beacon`, filtered or raw as configured
    #[must_use]
    pub fn range_column(&self, beacon: usize) -> String {
        self.columns
            .range_column(beacon, self.dataset.filter_ranges)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config = Config::parse("").expect("every section has a default");
        assert_eq!(config, Config::default());
        assert_eq!(config.dataset.dimension, Dimension::Two);
        assert!(config.dataset.filter_ranges);
        assert_eq!(config.range.bounds_policy, RangeBoundsPolicy::Keep);
        assert_eq!(config.range.stddev.get(), 0.75);
        assert_eq!(config.odometry.translation_covariance.get(), 0.02 * 0.02);
    }

    #[test]
    fn default_round_trips_through_toml() {
        let serialized = toml::to_string_pretty(&Config::default()).expect("serializable");
        let parsed = Config::parse(&serialized).expect("valid");
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn parse_kebab_case_sections() {
        let config = Config::parse(
            r#"
            [dataset]
            dimension = 3
            filter-ranges = false
            robot-prefix = "B"
            robot-index = 1

            [range]
            stddev = 0.5
            min-range = 1.0
            max-range = 80.0
            bounds-policy = "exclude"

            [columns]
            x-pos = "x"
            y-pos = "y"
            z-pos = "z"
            x-pos-gt = "gx"
            y-pos-gt = "gy"
            z-pos-gt = "gz"
            roll = "r"
            pitch = "p"
            yaw = "h"
            x-vel = "vx"
            y-vel = "vy"
            z-vel = "vz"
            range-prefix = "r_"
            filtered-range-prefix = "fr_"
            "#,
        )
        .expect("valid");
        assert_eq!(config.dataset.dimension, Dimension::Three);
        assert_eq!(config.dataset.robot_prefix, 'B');
        assert_eq!(config.range.bounds_policy, RangeBoundsPolicy::Exclude);
        assert_eq!(config.range_column(0), "r_1");
        assert_eq!(config.columns.rotation_columns(Dimension::Three), vec!["r", "p", "h"]);
        // untouched section keeps its defaults
        assert_eq!(config.odometry, OdometrySection::default());
    }

    #[test]
    fn partial_sections_keep_defaults_for_missing_keys() {
        let config = Config::parse("[range]\nbounds-policy = \"exclude\"").expect("valid config");
        assert_eq!(config.range.bounds_policy, RangeBoundsPolicy::Exclude);
        assert_eq!(config.range.stddev.get(), 0.75);
        assert_eq!(config.range.max_range, 150.0);

        let config = Config::parse("[dataset]\ndimension = 3\n\n[columns]\nyaw = \"heading\"")
            .expect("valid config");
        assert_eq!(config.dataset.dimension, Dimension::Three);
        assert!(config.dataset.filter_ranges);
        assert_eq!(config.dataset.robot_prefix, 'A');
        assert_eq!(config.columns.yaw, "heading");
        assert_eq!(config.columns.x_pos, "insXYZ_1");
        assert_eq!(config.odometry, OdometrySection::default());
    }

    #[test]
    fn rejects_unsupported_dimension() {
        let result = Config::parse("[dataset]\ndimension = 4");
        assert!(matches!(result, Err(ParseError::Toml(_))));
    }

    #[test]
    fn rejects_non_positive_covariance() {
        let result = Config::parse(
            "[odometry]\ntranslation-covariance = 0.0\nrotation-covariance = 0.1",
        );
        assert!(matches!(result, Err(ParseError::Toml(_))));
    }

    #[test]
    fn rejects_unordered_range_bounds() {
        let mut config = Config::default();
        config.range.min_range = 10.0;
        config.range.max_range = 5.0;
        assert_eq!(
            config.validate(),
            Err(ValidationError::RangeBounds {
                min: 10.0,
                max: 5.0,
            })
        );
    }

    #[test]
    fn rejects_landmark_prefix_for_robots() {
        let mut config = Config::default();
        config.dataset.robot_prefix = 'L';
        assert_eq!(config.validate(), Err(ValidationError::RobotPrefix('L')));
        config.dataset.robot_prefix = '7';
        assert_eq!(config.validate(), Err(ValidationError::RobotPrefix('7')));
    }

    #[test]
    fn rejects_identical_range_prefixes() {
        let mut config = Config::default();
        config.columns.filtered_range_prefix = "ranges_".to_string();
        assert_eq!(
            config.validate(),
            Err(ValidationError::SameRangePrefix("ranges_".to_string()))
        );
    }

    #[test]
    fn column_selection_follows_dimension() {
        let columns = ColumnSection::default();
        assert_eq!(
            columns.position_columns(Dimension::Two),
            vec!["insXYZ_1", "insXYZ_2"]
        );
        assert_eq!(columns.rotation_columns(Dimension::Two), vec!["insRPY_3"]);
        assert_eq!(columns.state_columns(Dimension::Two).len(), 2 + 2 + 1 + 2);
        assert_eq!(columns.state_columns(Dimension::Three).len(), 3 + 3 + 3 + 3);
        assert!(columns.is_raw_range_column("ranges_2"));
        assert!(!columns.is_raw_range_column("filtered_ranges_2"));
        assert!(columns.is_filtered_range_column("filtered_ranges_2"));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let range = RangeSection::default();
        assert!(range.in_bounds(2.0));
        assert!(range.in_bounds(150.0));
        assert!(!range.in_bounds(1.0));
        assert!(!range.in_bounds(150.5));
        assert!(!range.in_bounds(f64::NAN));
    }
}
