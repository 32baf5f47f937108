use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("no place with id {id}")]
    NotFound { id: i64 },
}

pub type Result<T> = std::result::Result<T, Error>;
