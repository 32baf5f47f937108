/// Crate-wide result type for provider calls.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures talking to geocoding, place-details, or shortening services.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No credential configured for the service.
    #[error("{service}: no credential configured")]
    MissingCredential { service: &'static str },

    /// Transport-level failure (connect, timeout, body decode).
    #[error("{service} request failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status.
    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// The service answered but reported an error in its payload.
    #[error("{service} error {status}: {message}")]
    Api {
        service: &'static str,
        status: String,
        message: String,
    },

    /// The payload was missing a field we depend on.
    #[error("{service} response invalid: {message}")]
    InvalidResponse {
        service: &'static str,
        message: String,
    },
}

impl Error {
    pub(crate) fn http(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Http { service, source }
    }

    pub(crate) fn invalid(service: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            service,
            message: message.into(),
        }
    }

    /// Short label for metrics and logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredential { .. } => "missing_credential",
            Self::Http { .. } => "http",
            Self::Status { .. } => "status",
            Self::Api { .. } => "api",
            Self::InvalidResponse { .. } => "invalid_response",
        }
    }
}
