//! Core data models for metarsearch
//!
//! This module contains the station identifier type and the result map handed
//! to the page renderer, plus the METAR client and HTML extractor.

pub mod extractor;
pub mod metar;

pub use extractor::{extract_metar_table, ExtractError};
pub use metar::{MetarClient, MetarError, ReportSource, RetryPolicy};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Suffix appended to a station identifier to form its template tag
pub const TAG_SUFFIX: &str = "_metar";

/// Value rendered for a station when neither a live report nor a cached one exists
pub const NO_METAR_AVAILABLE: &str = "Error - No METAR available";

/// Template tags exposed to the page renderer, keyed by `<station>_metar`,
/// in station order
pub type SearchListExtension = IndexMap<String, String>;

/// A station identifier was empty or contained characters other than ASCII letters and digits
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid station identifier: '{0}'. Use ASCII letters and digits only (e.g. lemd)")]
pub struct InvalidStation(pub String);

/// An airport whose METAR report should be fetched, e.g. `lemd`
///
/// The identifier ends up verbatim in the request URL and in the cache file
/// name, so only ASCII alphanumerics are accepted. Case is kept as configured
/// because it also names the template tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Airport(String);

impl Airport {
    /// Validates and wraps a station identifier
    pub fn new(code: impl Into<String>) -> Result<Self, InvalidStation> {
        let code = code.into();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(InvalidStation(code));
        }
        Ok(Self(code))
    }

    /// The identifier as configured
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Template tag name for this station (`lemd` -> `lemd_metar`)
    pub fn tag_name(&self) -> String {
        format!("{}{}", self.0, TAG_SUFFIX)
    }
}

impl fmt::Display for Airport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Airport {
    type Err = InvalidStation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim())
    }
}

impl TryFrom<String> for Airport {
    type Error = InvalidStation;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Airport> for String {
    fn from(airport: Airport) -> Self {
        airport.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_airport_accepts_icao_codes() {
        let airport = Airport::new("lemd").unwrap();
        assert_eq!(airport.code(), "lemd");
        assert_eq!(airport.to_string(), "lemd");

        assert!(Airport::new("EDDG").is_ok());
        assert!(Airport::new("K2G4").is_ok());
    }

    #[test]
    fn test_airport_rejects_invalid_identifiers() {
        assert_eq!(Airport::new(""), Err(InvalidStation(String::new())));
        assert!(Airport::new("../etc/passwd").is_err());
        assert!(Airport::new("le md").is_err());
        assert!(Airport::new("lemd+").is_err());
    }

    #[test]
    fn test_tag_name_appends_suffix() {
        let airport = Airport::new("eddg").unwrap();
        assert_eq!(airport.tag_name(), "eddg_metar");
    }

    #[test]
    fn test_from_str_trims_whitespace() {
        let airport: Airport = " lemd ".parse().unwrap();
        assert_eq!(airport.code(), "lemd");
    }

    #[test]
    fn test_invalid_station_message_names_identifier() {
        let err = Airport::new("bad/code").unwrap_err();
        assert!(err.to_string().contains("bad/code"));
    }

    #[test]
    fn test_airport_serializes_as_plain_string() {
        let airport = Airport::new("lemd").unwrap();
        let json = serde_json::to_string(&airport).unwrap();
        assert_eq!(json, "\"lemd\"");

        let parsed: Airport = serde_json::from_str("\"eddg\"").unwrap();
        assert_eq!(parsed.code(), "eddg");
        assert!(serde_json::from_str::<Airport>("\"no good\"").is_err());
    }
}
