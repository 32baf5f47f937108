use thiserror::Error;

/// Reasons a message gets no reply at all.
///
/// Address-not-found, ambiguous matches, and exhausted pages are not errors;
/// they are ordinary [`crate::ReplyOutcome`]s.
#[derive(Debug, Error)]
pub enum Error {
    /// More than one session row for a sender.
    #[error("{count} session rows for sender {sender}")]
    DuplicateSession { sender: String, count: usize },

    /// A NEXT request from an active sender with no stored search location.
    #[error("no active search location for sender {sender}")]
    MissingActiveLocation { sender: String },

    #[error("session store: {0}")]
    Store(#[source] askgeorge_sessions::Error),

    #[error("place store: {0}")]
    Places(#[from] askgeorge_places::Error),

    #[error(transparent)]
    Provider(#[from] askgeorge_providers::Error),
}

impl From<askgeorge_sessions::Error> for Error {
    fn from(err: askgeorge_sessions::Error) -> Self {
        match err {
            askgeorge_sessions::Error::DuplicateSession { sender, count } => {
                Self::DuplicateSession { sender, count }
            },
            other => Self::Store(other),
        }
    }
}

impl Error {
    /// Stored state contradicts itself, as opposed to a collaborator failing.
    #[must_use]
    pub fn is_data_integrity(&self) -> bool {
        matches!(
            self,
            Self::DuplicateSession { .. } | Self::MissingActiveLocation { .. }
        )
    }

    /// Short label for metrics and logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateSession { .. } => "duplicate_session",
            Self::MissingActiveLocation { .. } => "missing_active_location",
            Self::Store(_) => "session_store",
            Self::Places(_) => "place_store",
            Self::Provider(e) => e.kind(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
