//! Command-line interface parsing for metarsearch
//!
//! This module handles parsing of CLI arguments using clap and merges them over
//! the settings from the config file.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use directories::ProjectDirs;
use thiserror::Error;

use crate::config::{ConfigError, MetarConfig};
use crate::data::Airport;

/// File name of the config file in the user's config directory
pub const CONFIG_FILE_NAME: &str = "metarsearch.toml";

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// The configuration could not be loaded or is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// How the template tags are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// One HTML comment header plus table per station
    #[default]
    Html,
    /// The tag map as a JSON object
    Json,
}

/// metarsearch - fetch and cache METAR report tables for weather-station pages
#[derive(Parser, Debug)]
#[command(name = "metarsearch")]
#[command(about = "Fetch, cache and render METAR report tables")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to metarsearch.toml in the user config directory)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Station to report on, added to the configured ones (repeatable)
    ///
    /// Examples:
    ///   metarsearch --station lemd
    ///   metarsearch --station lemd --station eddg
    #[arg(short, long = "station", value_name = "CODE")]
    pub stations: Vec<Airport>,

    /// Minutes between refresh cycles
    #[arg(long, value_name = "MINUTES")]
    pub refresh_interval: Option<u64>,

    /// Directory for cached tables
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Html)]
    pub format: OutputFormat,

    /// Keep running and print the tags after every refresh cycle
    #[arg(long)]
    pub watch: bool,
}

/// Default config file location, if the platform has a config directory
pub fn default_config_path() -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "metarsearch")?;
    Some(project_dirs.config_dir().join(CONFIG_FILE_NAME))
}

impl Cli {
    /// Builds the runtime configuration from the config file and flags.
    ///
    /// An explicit `--config` must exist. Without it the default location is
    /// used if present, otherwise the built-in defaults.
    ///
    /// # Returns
    /// * `Ok(MetarConfig)` with flags applied and validated
    /// * `Err(CliError)` if the file cannot be loaded or the result is invalid
    pub fn to_config(&self) -> Result<MetarConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => MetarConfig::load_unvalidated(path)?,
            None => match default_config_path().filter(|path| path.exists()) {
                Some(path) => MetarConfig::load_unvalidated(&path)?,
                None => MetarConfig::default(),
            },
        };

        for station in &self.stations {
            if !config.stations.contains(station) {
                config.stations.push(station.clone());
            }
        }
        if let Some(minutes) = self.refresh_interval {
            config.refresh_interval = minutes;
        }
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = dir.clone();
        }

        config.validate()?;
        Ok(config)
    }
}
