/// Config schema types (server, database, providers, search, reply texts).
use std::{path::PathBuf, time::Duration};

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AskGeorgeConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub google: GoogleConfig,
    pub bitly: BitlyConfig,
    pub search: SearchConfig,
    pub messages: MessagesConfig,
    pub metrics: MetricsConfig,
}

/// Webhook server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "127.0.0.1".
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

/// SQLite database location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the database file. When unset, `<data_dir>/askgeorge.db` is used.
    pub path: Option<PathBuf>,
}

/// Google Maps Platform credentials and endpoints (geocoding + place details).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<Secret<String>>,
    pub geocode_url: String,
    pub place_details_url: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            geocode_url: "https://maps.googleapis.com/maps/api/geocode/json".into(),
            place_details_url: "https://maps.googleapis.com/maps/api/place/details/json".into(),
        }
    }
}

/// Bitly link shortener.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BitlyConfig {
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub access_token: Option<Secret<String>>,
    pub api_url: String,
    /// Branded short domain. Bitly uses `bit.ly` when unset.
    pub domain: Option<String>,
}

impl Default for BitlyConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            api_url: "https://api-ssl.bitly.com/v4/shorten".into(),
            domain: None,
        }
    }
}

/// Search session tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Results per reply.
    pub page_size: u32,
    /// A sender idle for this long loses their "next" context.
    pub inactivity_minutes: u64,
    /// IANA zone used to pick today's opening hours.
    pub timezone: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: 5,
            inactivity_minutes: 10,
            timezone: "America/New_York".into(),
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub fn inactivity(&self) -> Duration {
        Duration::from_secs(self.inactivity_minutes.saturating_mul(60))
    }

    /// Parsed timezone, `None` when the configured name is not a known IANA zone.
    #[must_use]
    pub fn tz(&self) -> Option<chrono_tz::Tz> {
        self.timezone.parse().ok()
    }
}

/// Fixed reply texts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    pub help: String,
    pub not_found: String,
    pub ambiguous: String,
    pub no_more_results: String,
    pub more_hint: String,
}

/// Welcome text sent to new senders and to idle senders asking for more.
pub const DEFAULT_HELP_TEXT: &str = "Welcome to Ask George!\n \n\
Text us your address and we'll send you the closest restrooms to you.\n\
Try an an intersection (\"45th st & 8th Ave\") or a street address (\"150 Park Ave, Manhattan\").\n\
\n\
1-325-8-LET-ME-P\n\
1-325-853-8637\n\
ask-george.herokuapp.com";

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            help: DEFAULT_HELP_TEXT.into(),
            not_found: "Address not found.".into(),
            ambiguous: "Multiple address matches. Please be more specific.".into(),
            no_more_results: "No more results".into(),
            more_hint: "Text NEXT for more results".into(),
        }
    }
}

/// Metrics collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment() {
        let cfg = AskGeorgeConfig::default();
        assert_eq!(cfg.search.page_size, 5);
        assert_eq!(cfg.search.inactivity(), Duration::from_secs(600));
        assert_eq!(cfg.search.tz(), Some(chrono_tz::America::New_York));
        assert_eq!(cfg.messages.not_found, "Address not found.");
        assert!(cfg.messages.help.starts_with("Welcome to Ask George!\n \n"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: AskGeorgeConfig = toml::from_str(
            r#"
            [search]
            page_size = 3

            [google]
            api_key = "g-key"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.search.page_size, 3);
        assert_eq!(cfg.search.inactivity_minutes, 10);
        assert_eq!(
            cfg.google.api_key.as_ref().map(|k| k.expose_secret().as_str()),
            Some("g-key")
        );
        assert!(cfg.google.geocode_url.ends_with("/geocode/json"));
    }

    #[test]
    fn unknown_timezone_is_none() {
        let search = SearchConfig {
            timezone: "Mars/Olympus".into(),
            ..Default::default()
        };
        assert!(search.tz().is_none());
    }
}
