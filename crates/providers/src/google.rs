//! Google Maps Platform client: Geocoding API and Place Details API.

use {
    askgeorge_common::types::Coordinate,
    askgeorge_config::GoogleConfig,
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tracing::{debug, warn},
};

#[cfg(feature = "metrics")]
use askgeorge_metrics::{counter, labels, providers as provider_metrics};

use crate::{
    BusinessStatus, GeocodeOutcome, Geocoder, PlaceDetails, PlaceDetailsProvider,
    error::{Error, Result},
};

const GEOCODE: &str = "google geocode";
const DETAILS: &str = "google place details";

/// Fields requested from Place Details; anything else is billed but unused.
const DETAIL_FIELDS: &str = "name,opening_hours,business_status,url";

/// Client for the two Google endpoints the assistant uses.
pub struct GoogleMapsClient {
    http: reqwest::Client,
    api_key: Secret<String>,
    geocode_url: String,
    place_details_url: String,
}

impl GoogleMapsClient {
    pub fn new(
        http: reqwest::Client,
        api_key: Secret<String>,
        geocode_url: impl Into<String>,
        place_details_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_key,
            geocode_url: geocode_url.into(),
            place_details_url: place_details_url.into(),
        }
    }

    /// Build from config using the shared HTTP client.
    pub fn from_config(config: &GoogleConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.expose_secret().is_empty())
            .ok_or(Error::MissingCredential { service: "google" })?;
        Ok(Self::new(
            crate::shared_http_client().clone(),
            api_key,
            &config.geocode_url,
            &config.place_details_url,
        ))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        service: &'static str,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let resp = self
            .http
            .get(url)
            .query(query)
            .query(&[("key", self.api_key.expose_secret().as_str())])
            .send()
            .await
            .map_err(Error::http(service))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(service, status = status.as_u16(), "provider returned error status");
            return Err(Error::Status {
                service,
                status: status.as_u16(),
                body,
            });
        }
        resp.json().await.map_err(Error::http(service))
    }
}

// ── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    #[serde(default)]
    result: Option<DetailsResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResult {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    opening_hours: Option<OpeningHours>,
    #[serde(default)]
    business_status: BusinessStatus,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpeningHours {
    #[serde(default)]
    weekday_text: Vec<String>,
}

/// Map a geocode payload to an outcome. Statuses other than `OK` and
/// `ZERO_RESULTS` are service faults, not "address not found".
fn geocode_outcome(resp: GeocodeResponse) -> Result<GeocodeOutcome> {
    match resp.status.as_str() {
        "OK" => match resp.results.as_slice() {
            [] => Ok(GeocodeOutcome::NotFound),
            [only] => Ok(GeocodeOutcome::Found(Coordinate::new(
                only.geometry.location.lat,
                only.geometry.location.lng,
            ))),
            many => Ok(GeocodeOutcome::Ambiguous(many.len())),
        },
        "ZERO_RESULTS" => Ok(GeocodeOutcome::NotFound),
        _ => Err(Error::Api {
            service: GEOCODE,
            status: resp.status,
            message: resp.error_message.unwrap_or_default(),
        }),
    }
}

fn place_details(resp: DetailsResponse) -> Result<PlaceDetails> {
    if resp.status != "OK" {
        return Err(Error::Api {
            service: DETAILS,
            status: resp.status,
            message: resp.error_message.unwrap_or_default(),
        });
    }
    let result = resp
        .result
        .ok_or_else(|| Error::invalid(DETAILS, "missing result"))?;
    let url = result
        .url
        .ok_or_else(|| Error::invalid(DETAILS, "missing url"))?;

    Ok(PlaceDetails {
        name: result.name,
        weekday_hours: result
            .opening_hours
            .map(|h| h.weekday_text)
            .filter(|lines| !lines.is_empty()),
        status: result.business_status,
        url,
    })
}

#[async_trait]
impl Geocoder for GoogleMapsClient {
    async fn geocode(&self, search: &str) -> Result<GeocodeOutcome> {
        #[cfg(feature = "metrics")]
        let started = std::time::Instant::now();

        // Search strings use `+` as the word separator; the query encoder
        // would otherwise send it as a literal plus.
        let address = search.replace('+', " ");
        let resp: Result<GeocodeResponse> = self
            .get_json(GEOCODE, &self.geocode_url, &[("address", address.as_str())])
            .await;
        let outcome = resp.and_then(geocode_outcome);

        #[cfg(feature = "metrics")]
        {
            crate::record_request("google", "geocode", started);
            let label = match &outcome {
                Ok(GeocodeOutcome::Found(_)) => "found",
                Ok(GeocodeOutcome::NotFound) => "not_found",
                Ok(GeocodeOutcome::Ambiguous(_)) => "ambiguous",
                Err(_) => "error",
            };
            counter!(provider_metrics::GEOCODE_TOTAL, labels::OUTCOME => label).increment(1);
        }

        debug!(search, outcome = ?outcome.as_ref().ok(), "geocoded");
        outcome
    }
}

#[async_trait]
impl PlaceDetailsProvider for GoogleMapsClient {
    async fn place_details(&self, place_ref: &str) -> Result<PlaceDetails> {
        #[cfg(feature = "metrics")]
        let started = std::time::Instant::now();

        let resp: Result<DetailsResponse> = self
            .get_json(
                DETAILS,
                &self.place_details_url,
                &[("place_id", place_ref), ("fields", DETAIL_FIELDS)],
            )
            .await;
        let details = resp.and_then(place_details);

        #[cfg(feature = "metrics")]
        {
            crate::record_request("google", "place_details", started);
            counter!(provider_metrics::DETAILS_TOTAL).increment(1);
            if let Err(e) = &details {
                counter!(provider_metrics::DETAILS_ERRORS_TOTAL, labels::ERROR_TYPE => e.kind())
                    .increment(1);
            }
        }

        details
    }
}
