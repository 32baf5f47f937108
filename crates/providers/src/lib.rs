//! External services the reply pipeline depends on: geocoding, live place
//! details, and link shortening.
//!
//! Each service sits behind a trait so the pipeline can be driven by fakes in
//! tests; the concrete clients talk to Google Maps Platform and Bitly.

pub mod bitly;
pub mod error;
pub mod google;

use std::{sync::LazyLock, time::Duration};

use {
    askgeorge_common::types::Coordinate,
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
};

pub use {
    bitly::BitlyShortener,
    error::{Error, Result},
    google::GoogleMapsClient,
};

/// Upper bound for any single provider round trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared HTTP client for provider calls.
///
/// Reused across clients to share connection pools, DNS cache, and TLS sessions.
pub fn shared_http_client() -> &'static reqwest::Client {
    static CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
        reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("askgeorge/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    });
    &CLIENT
}

// ── Geocoding ───────────────────────────────────────────────────────────────

/// Result of resolving a search string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeocodeOutcome {
    /// Exactly one match.
    Found(Coordinate),
    /// No match at all.
    NotFound,
    /// More than one candidate; the sender must be more specific.
    Ambiguous(usize),
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, search: &str) -> Result<GeocodeOutcome>;
}

// ── Place details ───────────────────────────────────────────────────────────

/// Operating state reported by the place provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusinessStatus {
    Operational,
    ClosedTemporarily,
    ClosedPermanently,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Live details for one point of interest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceDetails {
    pub name: Option<String>,
    /// One line per day, Monday first, e.g. `"Monday: 7:00 AM – 11:00 PM"`.
    pub weekday_hours: Option<Vec<String>>,
    pub status: BusinessStatus,
    /// Canonical map link for directions.
    pub url: String,
}

#[async_trait]
pub trait PlaceDetailsProvider: Send + Sync {
    async fn place_details(&self, place_ref: &str) -> Result<PlaceDetails>;
}

// ── Link shortening ─────────────────────────────────────────────────────────

#[async_trait]
pub trait LinkShortener: Send + Sync {
    async fn shorten(&self, url: &str) -> Result<String>;
}

#[cfg(feature = "metrics")]
pub(crate) fn record_request(
    provider: &'static str,
    operation: &'static str,
    started: std::time::Instant,
) {
    use askgeorge_metrics::{histogram, labels, providers};

    histogram!(
        providers::REQUEST_DURATION_SECONDS,
        labels::PROVIDER => provider,
        labels::OPERATION => operation
    )
    .record(started.elapsed().as_secs_f64());
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_status_decodes_known_and_unknown() {
        let parsed: Vec<BusinessStatus> = serde_json::from_str(
            r#"["OPERATIONAL", "CLOSED_TEMPORARILY", "CLOSED_PERMANENTLY", "SOMETHING_NEW"]"#,
        )
        .unwrap();
        assert_eq!(
            parsed,
            [
                BusinessStatus::Operational,
                BusinessStatus::ClosedTemporarily,
                BusinessStatus::ClosedPermanently,
                BusinessStatus::Unknown,
            ]
        );
    }
}
