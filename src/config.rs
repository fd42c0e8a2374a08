//! Configuration loading for metarsearch
//!
//! Settings live in a TOML file under a `[MetarReport]` table. Scalar keys
//! tune refresh and retry behaviour; every sub-table names a station:
//!
//! ```toml
//! [MetarReport]
//! refresh_interval = 5
//!
//! [MetarReport.lemd]
//! [MetarReport.eddg]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::data::metar::METAR_BASE_URL;
use crate::data::{Airport, InvalidStation, RetryPolicy};

/// Default minutes between refresh cycles
pub const DEFAULT_REFRESH_INTERVAL: u64 = 5;

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has the wrong shape
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A station sub-table has an unusable name
    #[error(transparent)]
    InvalidStation(#[from] InvalidStation),

    /// One or more settings are out of range
    #[error("Invalid config:\n - {0}")]
    Invalid(String),
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq)]
pub struct MetarConfig {
    /// Stations to report on, in file order
    pub stations: Vec<Airport>,
    /// Minutes between refresh cycles
    pub refresh_interval: u64,
    /// Directory for `<station>.metar` cache files
    pub cache_dir: PathBuf,
    /// METAR form URL without query string
    pub base_url: String,
    /// Request retry behaviour
    pub retry: RetryPolicy,
}

impl Default for MetarConfig {
    fn default() -> Self {
        Self {
            stations: Vec::new(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            cache_dir: std::env::temp_dir(),
            base_url: METAR_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(rename = "MetarReport", default)]
    metar_report: Option<ReportSection>,
}

/// Raw `[MetarReport]` table; durations are whole seconds
#[derive(Debug, Deserialize)]
struct ReportSection {
    refresh_interval: Option<u64>,
    cache_dir: Option<PathBuf>,
    base_url: Option<String>,
    timeout: Option<u64>,
    max_attempts: Option<u32>,
    backoff_min: Option<u64>,
    backoff_max: Option<u64>,
    #[serde(flatten)]
    rest: toml::Table,
}

impl MetarConfig {
    /// Parses configuration from TOML text and validates it
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config = Self::parse(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load_unvalidated(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a config file without validation, for callers that layer
    /// further settings on top before validating
    pub fn load_unvalidated(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(contents)?;
        let mut config = MetarConfig::default();

        let Some(section) = file.metar_report else {
            log::warn!("No [MetarReport] table in config, no stations configured");
            return Ok(config);
        };

        for (name, value) in section.rest {
            if value.is_table() {
                config.stations.push(Airport::new(name)?);
            } else {
                log::warn!("Ignoring unknown MetarReport setting '{}'", name);
            }
        }

        if let Some(minutes) = section.refresh_interval {
            config.refresh_interval = minutes;
        }
        if let Some(dir) = section.cache_dir {
            config.cache_dir = dir;
        }
        if let Some(url) = section.base_url {
            config.base_url = url;
        }
        if let Some(secs) = section.timeout {
            config.retry.timeout = Duration::from_secs(secs);
        }
        if let Some(attempts) = section.max_attempts {
            config.retry.max_attempts = attempts;
        }
        if let Some(secs) = section.backoff_min {
            config.retry.backoff_min = Duration::from_secs(secs);
        }
        if let Some(secs) = section.backoff_max {
            config.retry.backoff_max = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Checks every setting and reports all problems at once
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut issues: Vec<String> = Vec::new();

        if self.stations.is_empty() {
            issues.push("at least one station must be configured".into());
        }
        for (i, station) in self.stations.iter().enumerate() {
            if self.stations[..i].contains(station) {
                issues.push(format!("station '{}' is configured twice", station));
            }
        }
        if self.retry.max_attempts == 0 {
            issues.push("max_attempts must be > 0".into());
        }
        if self.retry.timeout.is_zero() {
            issues.push("timeout must be > 0".into());
        }
        if self.retry.backoff_min > self.retry.backoff_max {
            issues.push("backoff_min must be <= backoff_max".into());
        }
        if self.base_url.trim().is_empty() {
            issues.push("base_url must not be empty".into());
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(issues.join("\n - ")))
        }
    }
}
