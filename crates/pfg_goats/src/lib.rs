//! Ingestion of GOATS acoustic ranging datasets.
//!
//! ```no_run
//! use pfg_config::Config;
//! use pfg_goats::{find_dataset_files, GoatsParser};
//!
//! let (data, beacons) = find_dataset_files("goats_14")?;
//! let parser = GoatsParser::new(data, beacons, &Config::default())?;
//! let (graph, report) = parser.ingest()?;
//! println!("{} poses\n{report}", graph.num_poses());
//! # Ok::<(), pfg_goats::IngestError>(())
//! ```

pub mod beacons;
mod error;
pub mod parser;
pub mod report;
pub mod table;

pub use beacons::BeaconTable;
pub use error::{IngestError, Result};
pub use parser::{find_dataset_files, ingest, GoatsParser};
pub use report::IngestReport;
pub use table::SensorTable;
