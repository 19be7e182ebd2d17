#![deny(missing_docs)]

use std::path::{Path, PathBuf};

use directories::BaseDirs;

use super::Config;

/// Error type for [`read_config`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigReaderError {
    /// IO error, i.e. could not read file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// No config file found among the default locations or the one given as
    /// input
    #[error("No config file found")]
    NoConfigFile,
    /// Config parse error. See [`ParseError`](super::ParseError)
    #[error("Parse error {0}")]
    Parse(#[from] super::ParseError),
}

/// Result type for [`read_config`]
pub type Result<T> = std::result::Result<T, ConfigReaderError>;

/// Locations searched when no config file is given, in order:
/// 1. `<user config dir>/goats2pfg/config.toml`
/// 2. `./config/goats2pfg.toml`
pub fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![];

    if let Some(base_dirs) = BaseDirs::new() {
        paths.push(base_dirs.config_dir().join("goats2pfg").join("config.toml"));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join("config/goats2pfg.toml"));
    }

    paths
}

/// Read the config at `path`, falling back to the [`default_paths`].
/// The first of them that exists is used.
///
/// # Errors
///
/// - [`ConfigReaderError::NoConfigFile`] if none of the candidates exists
/// - [`ConfigReaderError::Parse`] if the file found is not a valid config
pub fn read_config<P: AsRef<Path>>(path: Option<P>) -> Result<Config> {
    if let Some(path) = path
        .map(|p| p.as_ref().to_path_buf())
        .into_iter()
        .chain(default_paths())
        .find(|p| p.exists())
    {
        tracing::info!("reading config from {}", path.display());
        Ok(Config::from_file(path)?)
    } else {
        Err(ConfigReaderError::NoConfigFile)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::RangeBoundsPolicy;

    #[test]
    fn reads_given_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[range]\nstddev = 1.5\nmin-range = 0.0\nmax-range = 10.0\nbounds-policy = \"exclude\""
        )
        .expect("writable");
        let config = read_config(Some(file.path())).expect("valid config");
        assert_eq!(config.range.stddev.get(), 1.5);
        assert_eq!(config.range.bounds_policy, RangeBoundsPolicy::Exclude);
    }

    #[test]
    fn invalid_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[dataset]\nrobot-prefix = \"L\"").expect("writable");
        assert!(matches!(
            read_config(Some(file.path())),
            Err(ConfigReaderError::Parse(_))
        ));
    }
}
