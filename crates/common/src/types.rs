//! Message and location shapes shared by the transport, the stores, and the
//! reply pipeline.

use serde::{Deserialize, Serialize};

/// An inbound SMS as delivered by the transport webhook.
///
/// Field names follow the Twilio form encoding (`Body`, `From`, `FromCity`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InboundMessage {
    #[serde(default)]
    pub body: String,
    pub from: String,
    #[serde(default)]
    pub from_city: Option<String>,
    #[serde(default)]
    pub from_state: Option<String>,
    #[serde(default)]
    pub from_country: Option<String>,
    #[serde(default)]
    pub from_zip: Option<String>,
}

impl InboundMessage {
    pub fn new(from: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            from: from.into(),
            ..Default::default()
        }
    }

    /// Carrier-reported origin of the sender, recorded when a session is created.
    #[must_use]
    pub fn origin(&self) -> SenderOrigin {
        SenderOrigin {
            city: self.from_city.clone(),
            state: self.from_state.clone(),
            country: self.from_country.clone(),
            zip: self.from_zip.clone(),
        }
    }
}

/// Where the carrier says the sender's number is registered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderOrigin {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub zip: Option<String>,
}

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lng)
    }
}
