use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// More than one session row exists for a sender.
    #[error("{count} session rows for sender {sender}")]
    DuplicateSession { sender: String, count: usize },

    #[error("no session for sender {sender}")]
    NotFound { sender: String },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn not_found(sender: impl Into<String>) -> Self {
        Self::NotFound {
            sender: sender.into(),
        }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

impl askgeorge_common::FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

askgeorge_common::impl_context!();
