//! The headerless beacon location table.
//!
//! Each column is one beacon, each row one coordinate. Rows past the
//! dimension of the dataset are ignored.

use std::{io::Read, path::Path};

use csv::{ReaderBuilder, Trim};
use pfg_geometry::{Dimension, Float, Vector};

use crate::{IngestError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct BeaconTable {
    locations: Vec<Vector>,
}

impl BeaconTable {
    /// Read the beacon locations of a `dimension` dataset from a file.
    ///
    /// # Errors
    ///
    /// - [`IngestError::Csv`] if the file cannot be read as CSV
    /// - [`IngestError::BeaconTableTooShort`] if there are fewer rows than
    ///   coordinates
    /// - [`IngestError::InvalidBeaconCoordinate`] if a coordinate is not a
    ///   finite number
    pub fn from_path<P: AsRef<Path>>(path: P, dimension: Dimension) -> Result<Self> {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .trim(Trim::All)
            .from_path(path)?;
        Self::from_csv(reader, dimension)
    }

    /// Read the beacon locations of a `dimension` dataset from any reader.
    ///
    /// # Errors
    ///
    /// See [`BeaconTable::from_path`]
    pub fn from_reader<R: Read>(reader: R, dimension: Dimension) -> Result<Self> {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .trim(Trim::All)
            .from_reader(reader);
        Self::from_csv(reader, dimension)
    }

    fn from_csv<R: Read>(reader: csv::Reader<R>, dimension: Dimension) -> Result<Self> {
        let records = reader
            .into_records()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if records.len() < dimension.get() {
            return Err(IngestError::BeaconTableTooShort {
                rows: records.len(),
                dimension,
            });
        }

        let num_beacons = records.first().map_or(0, csv::StringRecord::len);
        let mut locations = vec![Vector::zeros(dimension.get()); num_beacons];
        for (row, record) in records.iter().take(dimension.get()).enumerate() {
            for (beacon, cell) in record.iter().enumerate() {
                let value = cell
                    .parse::<Float>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| IngestError::InvalidBeaconCoordinate {
                        beacon,
                        row,
                        value: cell.to_string(),
                    })?;
                locations[beacon][row] = value;
            }
        }

        Ok(Self { locations })
    }

    #[inline]
    pub fn num_beacons(&self) -> usize {
        self.locations.len()
    }

    pub fn location(&self, beacon: usize) -> Option<&Vector> {
        self.locations.get(beacon)
    }

    #[inline]
    pub fn locations(&self) -> &[Vector] {
        &self.locations
    }
}
