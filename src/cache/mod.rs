//! Cache module for storing extracted METAR tables to disk
//!
//! This module provides a cache manager that keeps the last successfully
//! extracted table per station, so a render cycle can fall back to stale data
//! when the upstream service is unavailable.

mod manager;

pub use manager::{CacheManager, CachedReport};
