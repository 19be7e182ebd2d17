//! Column oriented view of the sensor CSV.

use std::{collections::HashMap, io::Read, path::Path};

use csv::{ReaderBuilder, Trim};
use pfg_geometry::Float;
use serde::Serialize;
use tracing::debug;

use crate::Result;

/// A cell that could not be read as a number. Its value is stored as NaN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NonNumericCell {
    pub row:    usize,
    pub column: String,
    pub value:  String,
}

/// Read a single cell. Empty cells and `nan` are missing readings and read
/// as NaN. Returns `None` if the cell is not a number at all.
fn parse_cell(cell: &str) -> Option<Float> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        Some(Float::NAN)
    } else {
        cell.parse().ok()
    }
}

/// The sensor table of a dataset, one vector per column.
#[derive(Debug, Clone)]
pub struct SensorTable {
    headers:     Vec<String>,
    index:       HashMap<String, usize>,
    columns:     Vec<Vec<Float>>,
    rows:        usize,
    non_numeric: Vec<NonNumericCell>,
}

impl SensorTable {
    /// Read a CSV file with a header row.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Csv`](crate::IngestError::Csv) if the file
    /// cannot be opened or a row has the wrong number of fields.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_path(path)?;
        Self::from_csv(reader)
    }

    /// Read CSV data with a header row from any reader.
    ///
    /// # Errors
    ///
    /// See [`SensorTable::from_path`]
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);
        Self::from_csv(reader)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut index = HashMap::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            // first one wins for duplicated headers
            index.entry(header.clone()).or_insert(i);
        }

        let mut columns = vec![Vec::new(); headers.len()];
        let mut non_numeric = Vec::new();
        let mut rows = 0;
        for record in reader.records() {
            let record = record?;
            for (i, cell) in record.iter().enumerate() {
                let value = parse_cell(cell).unwrap_or_else(|| {
                    debug!(
                        "row {} column {}: {:?} is not a number, reading it as NaN",
                        rows, headers[i], cell
                    );
                    non_numeric.push(NonNumericCell {
                        row:    rows,
                        column: headers[i].clone(),
                        value:  cell.to_string(),
                    });
                    Float::NAN
                });
                columns[i].push(value);
            }
            rows += 1;
        }

        Ok(Self {
            headers,
            index,
            columns,
            rows,
            non_numeric,
        })
    }

    /// Column names in file order
    #[inline]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[inline]
    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&[Float]> {
        self.column_index(name).map(|i| self.column_at(i))
    }

    /// Position of the column named `name` in file order
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// # Panics
    ///
    /// Panics if `index` is not smaller than the number of columns.
    pub fn column_at(&self, index: usize) -> &[Float] {
        &self.columns[index]
    }

    #[inline]
    pub const fn num_rows(&self) -> usize {
        self.rows
    }

    /// Cells that were not numbers, in reading order
    #[inline]
    pub fn non_numeric_cells(&self) -> &[NonNumericCell] {
        &self.non_numeric
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn reads_columns() {
        let table = SensorTable::from_reader("a, b\n1.0, 2\n-3.5, 4e1\n".as_bytes())
            .expect("valid csv");
        assert_eq!(table.headers(), ["a", "b"]);
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.column("a"), Some([1.0, -3.5].as_slice()));
        assert_eq!(table.column("b"), Some([2.0, 40.0].as_slice()));
        assert_eq!(table.column("c"), None);
        assert!(table.non_numeric_cells().is_empty());
    }

    #[test]
    fn missing_cells_are_nan() {
        let table = SensorTable::from_reader("a,b,c\n,nan,NaN\n".as_bytes()).expect("valid csv");
        for name in ["a", "b", "c"] {
            assert!(table.column(name).expect("column exists")[0].is_nan());
        }
        assert!(table.non_numeric_cells().is_empty());
    }

    #[test]
    fn infinity_is_a_number() {
        let table = SensorTable::from_reader("a\ninf\n-inf\n".as_bytes()).expect("valid csv");
        let a = table.column("a").expect("column exists");
        assert_eq!(a[0], Float::INFINITY);
        assert_eq!(a[1], Float::NEG_INFINITY);
    }

    #[test]
    fn non_numeric_cells_are_nan_and_recorded() {
        let table = SensorTable::from_reader("a,b\n1,dropout\n".as_bytes()).expect("valid csv");
        assert!(table.column("b").expect("column exists")[0].is_nan());
        assert_eq!(
            table.non_numeric_cells(),
            [NonNumericCell {
                row:    0,
                column: "b".to_string(),
                value:  "dropout".to_string(),
            }]
        );
    }

    #[test]
    fn ragged_rows_are_an_error() {
        assert!(SensorTable::from_reader("a,b\n1,2\n3\n".as_bytes()).is_err());
    }
}
