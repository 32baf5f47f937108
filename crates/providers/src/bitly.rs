//! Bitly v4 link shortener.

use {
    askgeorge_config::BitlyConfig,
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    tracing::{debug, warn},
};

#[cfg(feature = "metrics")]
use askgeorge_metrics::{counter, labels, providers as provider_metrics};

use crate::{
    LinkShortener,
    error::{Error, Result},
};

const SERVICE: &str = "bitly";

pub struct BitlyShortener {
    http: reqwest::Client,
    access_token: Secret<String>,
    api_url: String,
    domain: Option<String>,
}

#[derive(Serialize)]
struct ShortenRequest<'a> {
    long_url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain: Option<&'a str>,
}

#[derive(Deserialize)]
struct ShortenResponse {
    /// Scheme-less short form, e.g. `bit.ly/3xYz`.
    id: String,
}

impl BitlyShortener {
    pub fn new(
        http: reqwest::Client,
        access_token: Secret<String>,
        api_url: impl Into<String>,
        domain: Option<String>,
    ) -> Self {
        Self {
            http,
            access_token,
            api_url: api_url.into(),
            domain,
        }
    }

    pub fn from_config(config: &BitlyConfig) -> Result<Self> {
        let token = config
            .access_token
            .clone()
            .filter(|t| !t.expose_secret().is_empty())
            .ok_or(Error::MissingCredential { service: SERVICE })?;
        Ok(Self::new(
            crate::shared_http_client().clone(),
            token,
            &config.api_url,
            config.domain.clone(),
        ))
    }

    async fn request(&self, url: &str) -> Result<String> {
        let resp = self
            .http
            .post(&self.api_url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&ShortenRequest {
                long_url: url,
                domain: self.domain.as_deref(),
            })
            .send()
            .await
            .map_err(Error::http(SERVICE))?;

        // Bitly answers 201 for a new link and 200 for one it already knows.
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "bitly shorten failed");
            return Err(Error::Status {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ShortenResponse = resp.json().await.map_err(Error::http(SERVICE))?;
        if parsed.id.is_empty() {
            return Err(Error::invalid(SERVICE, "empty link id"));
        }
        Ok(parsed.id)
    }
}

#[async_trait]
impl LinkShortener for BitlyShortener {
    async fn shorten(&self, url: &str) -> Result<String> {
        #[cfg(feature = "metrics")]
        let started = std::time::Instant::now();

        let result = self.request(url).await;

        #[cfg(feature = "metrics")]
        {
            crate::record_request(SERVICE, "shorten", started);
            let outcome = if result.is_ok() { "ok" } else { "error" };
            counter!(provider_metrics::SHORTEN_TOTAL, labels::OUTCOME => outcome).increment(1);
        }

        if let Ok(id) = &result {
            debug!(short = %id, "shortened link");
        }
        result
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, mockito::Matcher};

    fn shortener(server: &mockito::Server, domain: Option<&str>) -> BitlyShortener {
        BitlyShortener::new(
            reqwest::Client::new(),
            Secret::new("tok".into()),
            format!("{}/v4/shorten", server.url()),
            domain.map(String::from),
        )
    }

    #[tokio::test]
    async fn returns_scheme_less_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v4/shorten")
            .match_header("authorization", "Bearer tok")
            .match_body(Matcher::Json(serde_json::json!({
                "long_url": "https://maps.google.com/?cid=42"
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"bit.ly/3abcd","link":"https://bit.ly/3abcd"}"#)
            .create_async()
            .await;

        let id = shortener(&server, None)
            .shorten("https://maps.google.com/?cid=42")
            .await
            .unwrap();
        assert_eq!(id, "bit.ly/3abcd");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn sends_custom_domain() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v4/shorten")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "domain": "ask.ge"
            })))
            .with_status(200)
            .with_body(r#"{"id":"ask.ge/x1"}"#)
            .create_async()
            .await;

        let id = shortener(&server, Some("ask.ge"))
            .shorten("https://example.com")
            .await
            .unwrap();
        assert_eq!(id, "ask.ge/x1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_token_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v4/shorten")
            .with_status(403)
            .with_body(r#"{"message":"FORBIDDEN"}"#)
            .create_async()
            .await;

        let err = shortener(&server, None)
            .shorten("https://example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Status { status: 403, .. }));
    }

    #[test]
    fn from_config_requires_token() {
        assert!(matches!(
            BitlyShortener::from_config(&BitlyConfig::default()),
            Err(Error::MissingCredential { service: "bitly" })
        ));
    }
}
