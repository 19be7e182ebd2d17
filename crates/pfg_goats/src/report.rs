//! Diagnostics collected while ingesting a dataset.
//!
//! Sparse or implausible data is not an error. It is recorded here and
//! returned next to the factor graph.

use std::fmt;

use pfg_config::RangeBoundsPolicy;
use pfg_geometry::Float;
use serde::Serialize;

use crate::table::NonNumericCell;

/// A beacon left out of the graph because too few ranges were measured to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DroppedBeacon {
    pub beacon:   usize,
    /// Number of non-missing readings
    pub readings: usize,
    /// Readings needed to locate it
    pub required: usize,
}

/// A single range reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeReading {
    pub beacon: usize,
    pub row:    usize,
    pub dist:   Float,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    /// Rows of the sensor table
    pub rows: usize,
    /// Rows that became poses
    pub admitted_rows: Vec<usize>,
    /// Rows without a reading of an admitted beacon, except row 0
    pub skipped_rows: Vec<usize>,
    /// Beacons that became landmarks
    pub admitted_beacons: Vec<usize>,
    pub dropped_beacons: Vec<DroppedBeacon>,
    pub odometry_measurements: usize,
    pub range_measurements: usize,
    /// NaN readings of admitted beacons
    pub missing_ranges: usize,
    /// Infinite readings, always excluded
    pub non_finite_ranges: Vec<RangeReading>,
    /// Cells of the sensor table that were not numbers
    pub non_numeric_cells: Vec<NonNumericCell>,
    /// Readings outside `[min-range, max-range]`
    pub out_of_bounds_ranges: Vec<RangeReading>,
    /// Whether `out_of_bounds_ranges` were kept or excluded
    pub bounds_policy: RangeBoundsPolicy,
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "poses:      {} of {} rows ({} skipped)",
            self.admitted_rows.len(),
            self.rows,
            self.skipped_rows.len()
        )?;
        writeln!(
            f,
            "landmarks:  {} ({} dropped)",
            self.admitted_beacons.len(),
            self.dropped_beacons.len()
        )?;
        for dropped in &self.dropped_beacons {
            writeln!(
                f,
                "  beacon {} has {} of {} required ranges",
                dropped.beacon, dropped.readings, dropped.required
            )?;
        }
        writeln!(f, "odometry:   {}", self.odometry_measurements)?;
        writeln!(
            f,
            "ranges:     {} ({} missing, {} non-finite, {} non-numeric cells)",
            self.range_measurements,
            self.missing_ranges,
            self.non_finite_ranges.len(),
            self.non_numeric_cells.len()
        )?;
        write!(
            f,
            "out of bounds ranges: {} ({})",
            self.out_of_bounds_ranges.len(),
            self.bounds_policy
        )
    }
}
