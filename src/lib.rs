//! metarsearch library
//!
//! Fetches METAR report tables for a set of airports, caches the last good
//! table per airport on disk and exposes them as template tags.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod extension;
pub mod refresh;

pub use config::MetarConfig;
pub use data::{Airport, SearchListExtension};
pub use extension::{MetarSearch, TimeSpan};
