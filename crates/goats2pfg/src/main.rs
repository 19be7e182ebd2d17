//! Convert a GOATS run into a pose graph factor graph.
mod cli;

use std::path::{Path, PathBuf};

use anyhow::Context;
use pfg_config::{read_config, Config, ConfigReaderError};
use pfg_factorgraph::{draw::Primitive, FinalizedFactorGraph};
use pfg_geometry::Dimension;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Read the config file and apply the overrides given on the command line.
/// Without an explicit `--config` a missing config file means the defaults.
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match read_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(ConfigReaderError::NoConfigFile) if cli.config.is_none() => {
            info!("no config file found, using the default config");
            Config::default()
        }
        Err(err) => return Err(err).context("failed to read the config"),
    };

    if let Some(dimension) = cli.dimension {
        config.dataset.dimension = Dimension::try_from(usize::from(dimension))?;
    }
    if cli.raw_ranges {
        config.dataset.filter_ranges = false;
    }
    config.validate()?;
    Ok(config)
}

fn dataset_files(cli: &Cli) -> anyhow::Result<(PathBuf, PathBuf)> {
    match (&cli.dir, &cli.data, &cli.beacons) {
        (Some(dir), _, _) => Ok(pfg_goats::find_dataset_files(dir)?),
        (None, Some(data), Some(beacons)) => Ok((data.clone(), beacons.clone())),
        _ => anyhow::bail!("either --dir or both --data and --beacons must be given"),
    }
}

/// Primitives of every pose, landmark, loop closure and range of `graph`
fn draw_primitives(graph: &FinalizedFactorGraph) -> Vec<Primitive> {
    graph.draw_primitives()
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), value)?;
    info!("wrote {}", path.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = cli::parse_arguments();

    if cli.dump_default {
        println!("{}", toml::to_string_pretty(&Config::default())?);
        return Ok(());
    }

    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    let (data, beacons) = dataset_files(&cli)?;
    let (graph, report) = pfg_goats::ingest(&data, &beacons, &config)
        .with_context(|| format!("failed to ingest {}", data.display()))?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| data.with_extension("json"));
    write_json(&output, &graph)?;

    if let Some(ref draw) = cli.draw {
        let primitives = draw_primitives(&graph);
        info!("{} draw primitives", primitives.len());
        write_json(draw, &primitives)?;
    }

    println!("{report}");
    Ok(())
}
