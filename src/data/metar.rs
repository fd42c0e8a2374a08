//! METAR report client for the aviation weather METAR form
//!
//! This module fetches the HTML report page for a station, retrying with a
//! long randomized backoff so the upstream service isn't hammered.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use super::{Airport, ExtractError};

/// Base URL for the METAR form
pub const METAR_BASE_URL: &str = "https://www.aviationweather.gov/adds/metars";

/// Errors that can occur when fetching a METAR report
#[derive(Debug, Error)]
pub enum MetarError {
    /// HTTP request failed or timed out
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("Unexpected HTTP status: {0}")]
    Status(StatusCode),

    /// Every attempt failed
    #[error("Request failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<MetarError>,
    },

    /// The page could not be turned into a report table
    #[error("Failed to extract METAR table: {0}")]
    Extract(#[from] ExtractError),
}

/// Retry behaviour for report requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts per station
    pub max_attempts: u32,
    /// Per-request timeout
    pub timeout: Duration,
    /// Lower bound of the randomized delay between attempts
    pub backoff_min: Duration,
    /// Upper bound of the randomized delay between attempts
    pub backoff_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout: Duration::from_secs(5),
            backoff_min: Duration::from_secs(3),
            backoff_max: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Draws a delay uniformly from `[backoff_min, backoff_max]`
    pub fn backoff(&self) -> Duration {
        let min = self.backoff_min.as_secs_f64();
        let max = self.backoff_max.as_secs_f64().max(min);
        Duration::from_secs_f64(rand::thread_rng().gen_range(min..=max))
    }

    /// Runs `attempt_once` until it succeeds or `max_attempts` is reached,
    /// sleeping a [`backoff`](Self::backoff) delay between attempts
    ///
    /// # Returns
    /// * `Ok(T)` - The first successful result
    /// * `Err(MetarError::RetriesExhausted)` - The last error, once attempts run out
    pub async fn retry<T, F, Fut>(
        &self,
        station: &Airport,
        mut attempt_once: F,
    ) -> Result<T, MetarError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, MetarError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match attempt_once().await {
                Ok(value) => {
                    log::info!("request succeeded for {} (attempt {})", station, attempt);
                    return Ok(value);
                }
                Err(err) if attempt >= max_attempts => {
                    log::info!("request failed for {}: {}", station, err);
                    return Err(MetarError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(err),
                    });
                }
                Err(err) => {
                    let delay = self.backoff();
                    log::debug!(
                        "attempt {} for {} failed ({}), retrying in {:.1}s",
                        attempt,
                        station,
                        err,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Something that can produce the raw METAR report page for a station
pub trait ReportSource {
    /// Fetches the raw report page body for `station`
    fn fetch_report(
        &self,
        station: &Airport,
    ) -> impl Future<Output = Result<String, MetarError>> + Send;
}

/// Client for fetching METAR report pages
#[derive(Debug, Clone)]
pub struct MetarClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl Default for MetarClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MetarClient {
    /// Create a new MetarClient with default settings
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: METAR_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// Create a new MetarClient with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            ..Self::new()
        }
    }

    /// Use a different base URL (mirrors, local test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use a custom retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The retry policy in effect
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Builds the report URL for a station
    pub fn report_url(&self, station: &Airport) -> String {
        format!(
            "{}?station_ids={}+&std_trans=translated&chk_metars=on&hoursStr=most+recent+only&chk_tafs=on&submitmet=Get+Weather",
            self.base_url,
            station.code()
        )
    }

    /// Performs a single request, failing on any non-success status
    async fn request_once(&self, url: &str) -> Result<String, MetarError> {
        let response = self
            .client
            .get(url)
            .timeout(self.retry.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetarError::Status(status));
        }

        Ok(response.text().await?)
    }

    /// Fetch the report page, retrying on any failure
    ///
    /// # Returns
    /// * `Ok(String)` - The raw page body
    /// * `Err(MetarError::RetriesExhausted)` - If every attempt failed
    pub async fn fetch_with_retry(&self, station: &Airport) -> Result<String, MetarError> {
        let url = self.report_url(station);
        log::info!("request URL - {}", url);

        self.retry.retry(station, || self.request_once(&url)).await
    }
}

impl ReportSource for MetarClient {
    async fn fetch_report(&self, station: &Airport) -> Result<String, MetarError> {
        self.fetch_with_retry(station).await
    }
}
