//! Cache manager for persisting extracted METAR tables to disk
//!
//! Provides a `CacheManager` that stores the last-known-good HTML for each
//! station as a plain `<station>.metar` file, read back when a live fetch fails.

use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// File extension used for cached station reports
const CACHE_EXTENSION: &str = "metar";

/// Result of reading from cache, including when the entry was last written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedReport {
    /// The cached HTML table
    pub html: String,
    /// When the cache file was last modified, if the filesystem reports it
    pub modified_at: Option<DateTime<Utc>>,
}

/// Manages reading and writing cached METAR tables to disk
///
/// Every station maps to one file, `<cache_dir>/<station>.metar`. Files are
/// overwritten on each successful extraction and never deleted.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheManager {
    /// Creates a new CacheManager in the system temp directory (`/tmp` on Linux)
    pub fn new() -> Self {
        Self {
            cache_dir: std::env::temp_dir(),
        }
    }

    /// Creates a new CacheManager with a custom cache directory
    pub fn with_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Directory holding the cache files
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path to the cache file for the given station
    pub fn cache_path(&self, station: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.{}", station, CACHE_EXTENSION))
    }

    /// Ensures the cache directory exists
    fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir)
    }

    /// Overwrites the cached table for a station
    ///
    /// # Returns
    /// * `Ok(PathBuf)` with the path written on success
    /// * `Err` if directory creation or file writing fails
    pub fn write(&self, station: &str, html: &str) -> std::io::Result<PathBuf> {
        self.ensure_dir()?;

        let path = self.cache_path(station);
        fs::write(&path, html)?;
        Ok(path)
    }

    /// Reads the cached table for a station
    ///
    /// Returns `None` if the file doesn't exist or cannot be read as UTF-8.
    pub fn read(&self, station: &str) -> Option<CachedReport> {
        let path = self.cache_path(station);
        let html = fs::read_to_string(&path).ok()?;
        let modified_at = fs::metadata(&path)
            .and_then(|meta| meta.modified())
            .ok()
            .map(DateTime::<Utc>::from);

        Some(CachedReport { html, modified_at })
    }
}
