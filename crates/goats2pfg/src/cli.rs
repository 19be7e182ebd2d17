//! cli argument parser module

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

/// Convert a GOATS run into a pose graph and write it as JSON.
///
/// The run is given either as a directory holding the sensor table and the
/// beacon table, or as the two files.
#[derive(Debug, Parser)]
#[clap(version, author, about)]
#[clap(group(ArgGroup::new("input").args(["dir", "data"])))]
pub struct Cli {
    /// Directory with exactly two .csv files, one of them with `beacon` in
    /// its name
    #[arg(long, value_name = "DIR", required_unless_present_any = ["data", "dump_default"])]
    pub dir: Option<PathBuf>,

    /// Sensor table of the run
    #[arg(long, value_name = "FILE", requires = "beacons")]
    pub data: Option<PathBuf>,

    /// Beacon locations of the run
    #[arg(long, value_name = "FILE", requires = "data")]
    pub beacons: Option<PathBuf>,

    /// Specify the configuration file to use, overrides the normal
    /// configuration file resolution
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Dimension of the pose graph, overrides `dataset.dimension`
    #[arg(long, value_parser = clap::value_parser!(u8).range(2..=3))]
    pub dimension: Option<u8>,

    /// Use the raw range columns instead of the outlier filtered ones
    #[arg(long)]
    pub raw_ranges: bool,

    /// Where to write the factor graph. Defaults to the sensor table with a
    /// .json extension
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Also write the draw primitives of the factor graph as JSON
    #[arg(long, value_name = "FILE")]
    pub draw: Option<PathBuf>,

    /// Dump the default config to stdout
    #[arg(long, conflicts_with = "input")]
    pub dump_default: bool,

    /// Log debug messages
    #[arg(short, long)]
    pub verbose: bool,
}

#[must_use]
pub fn parse_arguments() -> Cli {
    Cli::parse()
}
