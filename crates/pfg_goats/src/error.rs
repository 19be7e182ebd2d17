use std::path::PathBuf;

use pfg_factorgraph::{FactorGraphError, MeasurementError, VariableError};
use pfg_geometry::{Dimension, GeometryError};

/// Error type for reading a GOATS dataset and turning it into a factor graph.
///
/// Structural problems with the input are detected before any variable is
/// created. Data sparsity is not an error, see
/// [`IngestReport`](crate::IngestReport).
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("{} is not a file", .0.display())]
    NotAFile(PathBuf),
    #[error("{} is not a .csv file", .0.display())]
    WrongExtension(PathBuf),
    #[error("sensor table has no column named {0}")]
    MissingColumn(String),
    #[error("sensor table has no data rows")]
    NoRows,
    #[error(
        "number of beacons is inconsistent: {raw} range columns, {filtered} filtered range \
         columns and {beacons} beacon locations"
    )]
    BeaconCountMismatch {
        raw:      usize,
        filtered: usize,
        beacons:  usize,
    },
    #[error(
        "beacon table has {rows} rows, but a {dimension} dataset needs at least {}",
        .dimension.get()
    )]
    BeaconTableTooShort { rows: usize, dimension: Dimension },
    #[error("coordinate {row} of beacon {beacon} is not a finite number: {value:?}")]
    InvalidBeaconCoordinate {
        beacon: usize,
        row:    usize,
        value:  String,
    },
    #[error("column {column} is not finite at row {row}")]
    NonFiniteState { row: usize, column: String },
    #[error("cannot locate the dataset in {}: {reason}", .dir.display())]
    DatasetDirectory { dir: PathBuf, reason: String },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Measurement(#[from] MeasurementError),
    #[error(transparent)]
    Variable(#[from] VariableError),
    #[error(transparent)]
    FactorGraph(#[from] FactorGraphError),
}

/// Result type for ingestion
pub type Result<T> = std::result::Result<T, IngestError>;
