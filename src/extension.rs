//! Search-list extension exposing METAR tables to the page renderer
//!
//! `MetarSearch` owns the refresh state and the template tags. Each render
//! request passes through the refresh gate; when a refresh is due every station
//! is fetched in turn and its outcome resolved to a display string, falling back
//! to the cached table and then to a fixed error text.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::cache::CacheManager;
use crate::config::MetarConfig;
use crate::data::{
    extract_metar_table, Airport, MetarClient, MetarError, ReportSource, SearchListExtension,
    NO_METAR_AVAILABLE,
};
use crate::refresh::RefreshScheduler;

/// Time window of a render pass, as handed over by the page renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
}

impl TimeSpan {
    pub fn new(start: DateTime<Utc>, stop: DateTime<Utc>) -> Self {
        Self { start, stop }
    }
}

/// How a station's value was obtained in a refresh cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationReport {
    /// Freshly fetched and extracted table
    Fresh(String),
    /// Table from the on-disk cache after a failed fetch
    Cached(String),
    /// Neither a live nor a cached table was available
    Unavailable,
}

impl StationReport {
    /// The value to expose in the template tag
    pub fn into_html(self) -> String {
        match self {
            StationReport::Fresh(html) | StationReport::Cached(html) => html,
            StationReport::Unavailable => NO_METAR_AVAILABLE.to_string(),
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, StationReport::Fresh(_))
    }
}

/// Outcome of one refresh cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    /// Stations whose table was freshly generated
    pub generated: usize,
    /// Stations processed in total
    pub stations: usize,
    /// Wall-clock time spent on the cycle
    pub elapsed: Duration,
}

/// METAR search-list extension
pub struct MetarSearch<S> {
    stations: Vec<Airport>,
    source: S,
    cache: CacheManager,
    scheduler: RefreshScheduler,
    tags: SearchListExtension,
}

impl MetarSearch<MetarClient> {
    /// Builds the extension with a live METAR client from configuration
    pub fn from_config(config: &MetarConfig) -> Self {
        let client = MetarClient::new()
            .with_base_url(config.base_url.clone())
            .with_retry_policy(config.retry.clone());
        Self::new(
            config.stations.clone(),
            client,
            CacheManager::with_dir(config.cache_dir.clone()),
            config.refresh_interval,
        )
    }
}

impl<S: ReportSource> MetarSearch<S> {
    /// Creates the extension
    ///
    /// # Arguments
    /// * `stations` - Stations to report on, in display order
    /// * `source` - Where report pages come from
    /// * `cache` - Cache for last-known-good tables
    /// * `refresh_interval_minutes` - Minimum time between refresh cycles
    pub fn new(
        stations: Vec<Airport>,
        source: S,
        cache: CacheManager,
        refresh_interval_minutes: u64,
    ) -> Self {
        Self {
            stations,
            source,
            cache,
            scheduler: RefreshScheduler::new(refresh_interval_minutes),
            tags: SearchListExtension::new(),
        }
    }

    pub fn stations(&self) -> &[Airport] {
        &self.stations
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Current template tags, without triggering a refresh
    pub fn tags(&self) -> &SearchListExtension {
        &self.tags
    }

    /// Render entry point called by the page renderer on every pass
    ///
    /// The time window and database lookup are part of the renderer's
    /// extension protocol and are not used here. Returns a one-element list
    /// holding the template tags.
    pub async fn get_extension_list<F, D>(
        &mut self,
        timespan: &TimeSpan,
        db_lookup: F,
    ) -> Vec<SearchListExtension>
    where
        F: Fn(Option<&str>) -> D,
    {
        self.get_extension_list_at(Utc::now(), timespan, db_lookup).await
    }

    /// Same as [`get_extension_list`](Self::get_extension_list) with an explicit clock
    pub async fn get_extension_list_at<F, D>(
        &mut self,
        now: DateTime<Utc>,
        _timespan: &TimeSpan,
        _db_lookup: F,
    ) -> Vec<SearchListExtension>
    where
        F: Fn(Option<&str>) -> D,
    {
        self.refresh_if_due(now).await;
        vec![self.tags.clone()]
    }

    /// Runs a refresh cycle if the refresh interval has elapsed
    ///
    /// Returns `None` when the cycle was skipped.
    pub async fn refresh_if_due(&mut self, now: DateTime<Utc>) -> Option<CycleSummary> {
        if !self.scheduler.should_refresh(now) {
            log::debug!("METAR tables are current, skipping refresh");
            return None;
        }
        Some(self.refresh().await)
    }

    /// Fetches every station and updates the template tags
    async fn refresh(&mut self) -> CycleSummary {
        let started = Instant::now();
        let mut generated = 0;

        for station in &self.stations {
            let report = self.render_station(station).await;
            if report.is_fresh() {
                generated += 1;
            }
            self.tags.insert(station.tag_name(), report.into_html());
        }

        let elapsed = started.elapsed();
        log::info!(
            "Generated {} metar tables in {:.2} seconds",
            generated,
            elapsed.as_secs_f64()
        );

        CycleSummary {
            generated,
            stations: self.stations.len(),
            elapsed,
        }
    }

    /// Fetches and extracts one station, falling back to the cache
    async fn render_station(&self, station: &Airport) -> StationReport {
        match self.fetch_table(station).await {
            Ok(html) => {
                match self.cache.write(station.code(), &html) {
                    Ok(path) => log::info!("modified HTML written to {}", path.display()),
                    Err(e) => log::warn!("Could not cache METAR table for {}: {}", station, e),
                }
                StationReport::Fresh(html)
            }
            Err(e) => {
                log::warn!(
                    "Cannot get METAR report ({}): {}. Recovering the last file saved.",
                    station.tag_name(),
                    e
                );
                match self.cache.read(station.code()) {
                    Some(cached) => {
                        if let Some(modified_at) = cached.modified_at {
                            log::info!(
                                "Using cached METAR table for {} from {}",
                                station,
                                modified_at.to_rfc3339()
                            );
                        }
                        StationReport::Cached(cached.html)
                    }
                    None => {
                        log::warn!(
                            "There could not be found an older METAR report for {}",
                            station
                        );
                        StationReport::Unavailable
                    }
                }
            }
        }
    }

    async fn fetch_table(&self, station: &Airport) -> Result<String, MetarError> {
        let body = self.source.fetch_report(station).await?;
        Ok(extract_metar_table(&body)?)
    }
}
