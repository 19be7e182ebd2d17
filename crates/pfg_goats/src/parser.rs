//! Turning one GOATS run into a factor graph.
//!
//! A run is a sensor table, one row per timestep with the INS state, the
//! ground truth position and a range column per acoustic beacon, and a
//! beacon table with the surveyed beacon locations. The conversion is:
//!
//! 1. beacons with fewer than `dimension` readings are dropped, as their
//!    location is not constrained
//! 2. row 0, and every row with a reading of a kept beacon, becomes a pose
//! 3. consecutive poses are connected by odometry derived from the INS
//! 4. every finite reading of a kept beacon becomes a range measurement

use std::{
    io::Read,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use ndarray::Array2;
use pfg_config::{Config, RangeBoundsPolicy};
use pfg_factorgraph::{
    name::{landmark_name, pose_name},
    FactorGraph, FinalizedFactorGraph, LandmarkVariable, PoseMeasurement, PoseVariable,
    RangeMeasurement,
};
use pfg_geometry::{
    precision_from_covariance, relative_pose, transformation_matrix, Dimension, Float, Matrix,
    Orientation, Vector,
};
use tracing::{debug, info, warn};

use crate::{
    beacons::BeaconTable,
    report::{DroppedBeacon, IngestReport, RangeReading},
    table::SensorTable,
    IngestError, Result,
};

/// Check that `path` is an existing `.csv` file.
fn verify_is_csv_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(IngestError::NotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(IngestError::NotAFile(path.to_path_buf()));
    }
    if !has_csv_extension(path) {
        return Err(IngestError::WrongExtension(path.to_path_buf()));
    }
    Ok(())
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "csv")
}

/// Locate the sensor table and the beacon table of a run in `dir`.
/// The directory must contain exactly two `.csv` files, and exactly one of
/// them must have `beacon` in its name.
///
/// Returns `(data, beacons)`.
///
/// # Errors
///
/// - [`IngestError::Io`] if the directory cannot be read
/// - [`IngestError::DatasetDirectory`] if the files are not as described
pub fn find_dataset_files<P: AsRef<Path>>(dir: P) -> Result<(PathBuf, PathBuf)> {
    let dir = dir.as_ref();
    let csv_files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .filter_ok(|path| path.is_file() && has_csv_extension(path))
        .collect::<std::io::Result<_>>()?;

    if csv_files.len() != 2 {
        return Err(IngestError::DatasetDirectory {
            dir:    dir.to_path_buf(),
            reason: format!("expected two .csv files, found {}", csv_files.len()),
        });
    }

    let (beacons, data): (Vec<_>, Vec<_>) = csv_files.into_iter().partition(|path| {
        path.file_name()
            .is_some_and(|name| name.to_string_lossy().to_lowercase().contains("beacon"))
    });
    match (beacons.as_slice(), data.as_slice()) {
        ([beacons], [data]) => Ok((data.clone(), beacons.clone())),
        _ => Err(IngestError::DatasetDirectory {
            dir:    dir.to_path_buf(),
            reason: "exactly one of the .csv files must have 'beacon' in its name".to_string(),
        }),
    }
}

/// Positions of the mapped columns in the sensor table.
#[derive(Debug, Clone)]
struct ResolvedColumns {
    positions:    Vec<usize>,
    gt_positions: Vec<usize>,
    rotations:    Vec<usize>,
    velocities:   Vec<usize>,
    /// Selected range column of each beacon, raw or filtered
    ranges:       Vec<usize>,
}

impl ResolvedColumns {
    fn resolve(table: &SensorTable, beacons: &BeaconTable, config: &Config) -> Result<Self> {
        let dimension = config.dataset.dimension;
        let columns = &config.columns;
        let index_of = |name: &str| {
            table
                .column_index(name)
                .ok_or_else(|| IngestError::MissingColumn(name.to_string()))
        };
        let lookup = |names: Vec<&str>| names.into_iter().map(index_of).collect::<Result<Vec<_>>>();

        let positions = lookup(columns.position_columns(dimension))?;
        let gt_positions = lookup(columns.gt_position_columns(dimension))?;
        let rotations = lookup(columns.rotation_columns(dimension))?;
        let velocities = lookup(columns.velocity_columns(dimension))?;

        let raw = table
            .headers()
            .iter()
            .filter(|h| columns.is_raw_range_column(h))
            .count();
        let filtered = table
            .headers()
            .iter()
            .filter(|h| columns.is_filtered_range_column(h))
            .count();
        let num_beacons = beacons.num_beacons();
        if raw != num_beacons || filtered != num_beacons {
            return Err(IngestError::BeaconCountMismatch {
                raw,
                filtered,
                beacons: num_beacons,
            });
        }

        let mut ranges = Vec::with_capacity(num_beacons);
        for beacon in 0..num_beacons {
            let raw = index_of(columns.range_column(beacon, false).as_str())?;
            let filtered = index_of(columns.range_column(beacon, true).as_str())?;
            ranges.push(if config.dataset.filter_ranges { filtered } else { raw });
        }

        Ok(Self {
            positions,
            gt_positions,
            rotations,
            velocities,
            ranges,
        })
    }
}

/// Parser of a single GOATS run.
///
/// Construction reads both tables and checks their structure, so that
/// [`GoatsParser::ingest`] only fails on data that breaks an invariant of the
/// factor graph.
#[derive(Debug, Clone)]
pub struct GoatsParser {
    config:  Config,
    table:   SensorTable,
    beacons: BeaconTable,
    columns: ResolvedColumns,
}

impl GoatsParser {
    /// Read and check a run.
    ///
    /// # Errors
    ///
    /// - [`IngestError::NotFound`], [`IngestError::NotAFile`] or
    ///   [`IngestError::WrongExtension`] if either path is not a `.csv` file
    /// - [`IngestError::Csv`] if either file is not valid CSV
    /// - any structural error of [`GoatsParser::from_tables`]
    pub fn new<P, Q>(data: P, beacons: Q, config: &Config) -> Result<Self>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let data = data.as_ref();
        let beacons = beacons.as_ref();
        verify_is_csv_file(data)?;
        verify_is_csv_file(beacons)?;

        info!("loading data from {}", data.display());
        let table = SensorTable::from_path(data)?;
        info!("loading beacon locations from {}", beacons.display());
        let beacons = BeaconTable::from_path(beacons, config.dataset.dimension)?;

        Self::from_tables(table, beacons, config)
    }

    /// Read and check a run from any two readers.
    ///
    /// # Errors
    ///
    /// See [`GoatsParser::new`]
    pub fn from_readers<R, S>(data: R, beacons: S, config: &Config) -> Result<Self>
    where
        R: Read,
        S: Read,
    {
        let table = SensorTable::from_reader(data)?;
        let beacons = BeaconTable::from_reader(beacons, config.dataset.dimension)?;
        Self::from_tables(table, beacons, config)
    }

    /// Check the structure of two tables already read.
    ///
    /// # Errors
    ///
    /// - [`IngestError::NoRows`] if the sensor table is empty
    /// - [`IngestError::MissingColumn`] if a mapped column is absent
    /// - [`IngestError::BeaconCountMismatch`] if the number of raw range
    ///   columns, filtered range columns and beacons differ
    pub fn from_tables(table: SensorTable, beacons: BeaconTable, config: &Config) -> Result<Self> {
        if table.num_rows() == 0 {
            return Err(IngestError::NoRows);
        }
        let columns = ResolvedColumns::resolve(&table, &beacons, config)?;
        debug!(
            "{} rows, {} beacons, {} ranges",
            table.num_rows(),
            beacons.num_beacons(),
            if config.dataset.filter_ranges {
                "filtered"
            } else {
                "raw"
            }
        );
        Ok(Self {
            config: config.clone(),
            table,
            beacons,
            columns,
        })
    }

    #[inline]
    pub const fn dimension(&self) -> Dimension {
        self.config.dataset.dimension
    }

    #[inline]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub const fn num_rows(&self) -> usize {
        self.table.num_rows()
    }

    #[inline]
    pub fn num_beacons(&self) -> usize {
        self.beacons.num_beacons()
    }

    #[inline]
    pub fn beacon_locations(&self) -> &[Vector] {
        self.beacons.locations()
    }

    /// Range readings to `beacon`, raw or filtered as configured
    pub fn ranges(&self, beacon: usize) -> Option<&[Float]> {
        self.columns
            .ranges
            .get(beacon)
            .map(|&column| self.table.column_at(column))
    }

    fn stack(&self, columns: &[usize]) -> Matrix {
        Array2::from_shape_fn((self.num_rows(), columns.len()), |(row, col)| {
            self.table.column_at(columns[col])[row]
        })
    }

    fn row_vector(&self, columns: &[usize], row: usize) -> Vector {
        columns
            .iter()
            .map(|&column| self.table.column_at(column)[row])
            .collect()
    }

    /// INS positions, one row per timestep
    pub fn positions(&self) -> Matrix {
        self.stack(&self.columns.positions)
    }

    /// Ground truth positions, one row per timestep
    pub fn gt_positions(&self) -> Matrix {
        self.stack(&self.columns.gt_positions)
    }

    /// INS orientation, one row per timestep: `[yaw]` in 2D and
    /// `[roll, pitch, yaw]` in 3D
    pub fn rotations(&self) -> Matrix {
        self.stack(&self.columns.rotations)
    }

    /// INS velocities, one row per timestep
    pub fn velocities(&self) -> Matrix {
        self.stack(&self.columns.velocities)
    }

    /// INS poses, one row per timestep: `[x, y, theta]` in 2D and
    /// `[x, y, z, roll, pitch, yaw]` in 3D
    pub fn poses(&self) -> Matrix {
        let columns = self
            .columns
            .positions
            .iter()
            .chain(&self.columns.rotations)
            .copied()
            .collect::<Vec<_>>();
        self.stack(&columns)
    }

    fn orientation(&self, row: usize) -> Orientation {
        let rotation = self.row_vector(&self.columns.rotations, row);
        match self.dimension() {
            Dimension::Two => Orientation::planar(rotation[0]),
            Dimension::Three => Orientation::spatial(rotation[0], rotation[1], rotation[2]),
        }
    }

    fn ins_transform(&self, row: usize) -> Result<Matrix> {
        let position = self.row_vector(&self.columns.positions, row);
        Ok(transformation_matrix(
            &self.orientation(row).rotation_matrix(),
            &position,
        )?)
    }

    fn pose_name(&self, row: usize) -> String {
        pose_name(self.config.dataset.robot_prefix, row)
    }

    /// Build the factor graph of the run.
    ///
    /// # Errors
    ///
    /// - [`IngestError::NonFiniteState`] if the position, ground truth
    ///   position or orientation of a row that becomes a pose is not finite
    /// - [`IngestError::Geometry`] if the odometry covariances are not
    ///   strictly positive
    /// - any error of the factor graph, which a well formed run never causes
    pub fn ingest(&self) -> Result<(FinalizedFactorGraph, IngestReport)> {
        let mut report = IngestReport {
            rows: self.num_rows(),
            non_numeric_cells: self.table.non_numeric_cells().to_vec(),
            bounds_policy: self.config.range.bounds_policy,
            ..Default::default()
        };

        let beacons = self.admit_beacons(&mut report);
        let rows = self.admit_rows(&beacons, &mut report);
        self.check_state_is_finite(&rows)?;

        let mut graph = FactorGraph::new(self.dimension());
        self.add_landmarks(&mut graph, &beacons)?;
        self.add_poses(&mut graph, &rows)?;
        report.odometry_measurements = self.add_odometry(&mut graph, &rows)?;
        self.add_ranges(&mut graph, &beacons, &mut report)?;

        report.admitted_beacons = beacons;
        report.admitted_rows = rows;
        Ok((graph.finalize(), report))
    }

    /// Beacons with at least `dimension` non-missing readings
    fn admit_beacons(&self, report: &mut IngestReport) -> Vec<usize> {
        let required = self.dimension().get();
        (0..self.num_beacons())
            .filter(|&beacon| {
                let readings = self.columns_ranges(beacon).iter().filter(|d| !d.is_nan()).count();
                if readings < required {
                    warn!(
                        "beacon {beacon} has only {readings} ranges, so its position is not \
                         uniquely defined and it is not added to the factor graph"
                    );
                    report.dropped_beacons.push(DroppedBeacon {
                        beacon,
                        readings,
                        required,
                    });
                    false
                } else {
                    true
                }
            })
            .collect()
    }

    /// Row 0 and every row with a reading of an admitted beacon
    fn admit_rows(&self, beacons: &[usize], report: &mut IngestReport) -> Vec<usize> {
        (0..self.num_rows())
            .filter(|&row| {
                let has_range = beacons
                    .iter()
                    .any(|&beacon| !self.columns_ranges(beacon)[row].is_nan());
                if row == 0 || has_range {
                    true
                } else {
                    debug!("row {row} has no range measurements, so it is not added");
                    report.skipped_rows.push(row);
                    false
                }
            })
            .collect()
    }

    fn check_state_is_finite(&self, rows: &[usize]) -> Result<()> {
        let state = self
            .columns
            .positions
            .iter()
            .chain(&self.columns.gt_positions)
            .chain(&self.columns.rotations);
        for &column in state {
            let values = self.table.column_at(column);
            if let Some(&row) = rows.iter().find(|&&row| !values[row].is_finite()) {
                return Err(IngestError::NonFiniteState {
                    row,
                    column: self.table.headers()[column].clone(),
                });
            }
        }
        Ok(())
    }

    fn add_landmarks(&self, graph: &mut FactorGraph, beacons: &[usize]) -> Result<()> {
        for &beacon in beacons {
            let location = self.beacons.locations()[beacon].clone();
            graph.add_landmark_variable(LandmarkVariable::new(landmark_name(beacon), location)?)?;
        }
        Ok(())
    }

    fn add_poses(&self, graph: &mut FactorGraph, rows: &[usize]) -> Result<()> {
        warn!(
            "the dataset has no ground truth orientation, poses use the corrected INS orientation \
             which is also used to derive the odometry"
        );
        let robot = self.config.dataset.robot_index;
        for &row in rows {
            let pose = PoseVariable::new(
                self.pose_name(row),
                self.row_vector(&self.columns.gt_positions, row),
                self.orientation(row),
            )?;
            graph.add_pose_variable(robot, pose)?;
        }
        Ok(())
    }

    /// Relative INS motion between consecutive admitted rows.
    /// Returns the number of measurements added.
    fn add_odometry(&self, graph: &mut FactorGraph, rows: &[usize]) -> Result<usize> {
        let odometry = &self.config.odometry;
        let (translation_precision, rotation_precision) = precision_from_covariance(
            odometry.translation_covariance.get(),
            odometry.rotation_covariance.get(),
        )?;
        let robot = self.config.dataset.robot_index;

        let mut count = 0;
        for (&prev, &curr) in rows.iter().tuple_windows() {
            let (rotation, translation) =
                relative_pose(&self.ins_transform(prev)?, &self.ins_transform(curr)?)?;
            let odom = PoseMeasurement::new(
                self.pose_name(prev),
                self.pose_name(curr),
                translation,
                Orientation::from_rotation_matrix(&rotation)?,
                translation_precision,
                rotation_precision,
            )?;
            graph.add_odom_measurement(robot, odom)?;
            count += 1;
        }
        Ok(count)
    }

    fn add_ranges(
        &self,
        graph: &mut FactorGraph,
        beacons: &[usize],
        report: &mut IngestReport,
    ) -> Result<()> {
        let range = &self.config.range;
        let stddev = range.stddev.get();
        for &beacon in beacons {
            let landmark = landmark_name(beacon);
            for (row, &dist) in self.columns_ranges(beacon).iter().enumerate() {
                if dist.is_nan() {
                    report.missing_ranges += 1;
                    continue;
                }
                if dist.is_infinite() {
                    debug!("range {dist} to beacon {beacon} at row {row} is not finite");
                    report
                        .non_finite_ranges
                        .push(RangeReading { beacon, row, dist });
                    continue;
                }
                if !range.in_bounds(dist) {
                    debug!(
                        "range {dist} to beacon {beacon} at row {row} is outside [{}, {}]",
                        range.min_range, range.max_range
                    );
                    report
                        .out_of_bounds_ranges
                        .push(RangeReading { beacon, row, dist });
                    if range.bounds_policy == RangeBoundsPolicy::Exclude {
                        continue;
                    }
                }

                let measurement =
                    RangeMeasurement::new([self.pose_name(row), landmark.clone()], dist, stddev)?;
                graph.add_range_measurement(measurement)?;
                report.range_measurements += 1;
            }
        }
        Ok(())
    }

    /// Selected range column of a beacon known to exist
    fn columns_ranges(&self, beacon: usize) -> &[Float] {
        self.table.column_at(self.columns.ranges[beacon])
    }
}

/// Read a run and build its factor graph in one go.
///
/// # Errors
///
/// See [`GoatsParser::new`] and [`GoatsParser::ingest`]
pub fn ingest<P, Q>(
    data: P,
    beacons: Q,
    config: &Config,
) -> Result<(FinalizedFactorGraph, IngestReport)>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    GoatsParser::new(data, beacons, config)?.ingest()
}
